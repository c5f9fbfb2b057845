//! Spatial grids and grid interpolation.

use crate::core::FdError;

/// `n + 1` equally spaced nodes covering `[lo, hi]`.
pub fn uniform_grid(n: usize, lo: f64, hi: f64) -> Result<Vec<f64>, FdError> {
    if n < 1 {
        return Err(FdError::InvalidInput(
            "uniform grid needs at least one interval".to_string(),
        ));
    }
    if !lo.is_finite() || !hi.is_finite() || hi <= lo {
        return Err(FdError::InvalidInput(
            "uniform grid bounds must be finite with hi > lo".to_string(),
        ));
    }
    let h = (hi - lo) / n as f64;
    let mut grid = (0..=n).map(|i| lo + i as f64 * h).collect::<Vec<_>>();
    grid[n] = hi;
    Ok(grid)
}

/// Non-uniform `[0, s_max]` grid with `space_steps + 1` nodes concentrated around `anchor`.
///
/// Nodes follow `s_max * (a + alpha * sinh(y))` for equally spaced `y`, where
/// `a = anchor / s_max`; smaller `stretch` values cluster more points near the anchor.
pub fn stretched_grid(
    space_steps: usize,
    s_max: f64,
    anchor: f64,
    stretch: f64,
) -> Result<Vec<f64>, FdError> {
    if space_steps < 2 {
        return Err(FdError::InvalidInput(
            "space_steps must be >= 2".to_string(),
        ));
    }
    if s_max <= 0.0 || !s_max.is_finite() {
        return Err(FdError::InvalidInput(
            "s_max must be finite and > 0".to_string(),
        ));
    }
    if !anchor.is_finite() || anchor <= 0.0 {
        return Err(FdError::InvalidInput(
            "grid anchor must be finite and > 0".to_string(),
        ));
    }
    if !stretch.is_finite() || stretch <= 0.0 {
        return Err(FdError::InvalidInput(
            "grid_stretch must be finite and > 0".to_string(),
        ));
    }

    let a = (anchor / s_max).clamp(1.0e-8, 1.0 - 1.0e-8);
    let alpha = stretch.max(1.0e-6);
    let y_lo = (-a / alpha).asinh();
    let y_hi = ((1.0 - a) / alpha).asinh();
    let y_span = y_hi - y_lo;

    let mut grid = vec![0.0_f64; space_steps + 1];
    for (i, s) in grid.iter_mut().enumerate() {
        let x = i as f64 / space_steps as f64;
        let z = a + alpha * (y_lo + y_span * x).sinh();
        *s = (s_max * z).clamp(0.0, s_max);
    }
    grid[0] = 0.0;
    grid[space_steps] = s_max;

    ensure_strictly_increasing(&grid)?;
    Ok(grid)
}

/// Fails unless the nodes are finite and strictly increasing.
pub fn ensure_strictly_increasing(grid: &[f64]) -> Result<(), FdError> {
    if grid
        .windows(2)
        .any(|w| !w[0].is_finite() || !w[1].is_finite() || w[1] <= w[0])
    {
        return Err(FdError::NumericalError(
            "grid nodes must be finite and strictly increasing".to_string(),
        ));
    }
    Ok(())
}

/// Piecewise-linear interpolation of `values` at `x`, flat outside the grid.
///
/// Fails on an empty grid or when `values` and `grid` differ in length.
pub fn interpolate_on_grid(x: f64, grid: &[f64], values: &[f64]) -> Result<f64, FdError> {
    if grid.is_empty() {
        return Err(FdError::InvalidInput(
            "cannot interpolate on an empty grid".to_string(),
        ));
    }
    if values.len() != grid.len() {
        return Err(FdError::SizeMismatch {
            expected: grid.len(),
            found: values.len(),
        });
    }

    if x <= grid[0] {
        return Ok(values[0]);
    }
    let n = grid.len() - 1;
    if x >= grid[n] {
        return Ok(values[n]);
    }

    let hi = grid.partition_point(|&g| g < x).clamp(1, n);
    let lo = hi - 1;
    let w = (x - grid[lo]) / (grid[hi] - grid[lo]);
    Ok((1.0 - w) * values[lo] + w * values[hi])
}
