//! Stencil builders producing [`TridiagonalOperator`]s on (possibly non-uniform) grids.
//!
//! Interior rows use the standard 3-point non-uniform stencils. Boundary rows are left
//! at zero, which holds boundary values fixed under `I - dt * L`; time-varying boundary
//! values are refreshed by a [`DirichletBoundary`](super::condition::DirichletBoundary)
//! step condition instead.

use crate::core::FdError;

use super::grid::ensure_strictly_increasing;
use super::operator::LinearOperator;
use super::tridiagonal::TridiagonalOperator;

fn check_grid(grid: &[f64]) -> Result<(), FdError> {
    if grid.len() < 3 {
        return Err(FdError::InvalidInput(
            "a 3-point stencil needs at least 3 grid nodes".to_string(),
        ));
    }
    ensure_strictly_increasing(grid)
}

/// Spacings `(h_minus, h_plus)` around interior node `i`.
#[inline]
fn spacings(grid: &[f64], i: usize) -> (f64, f64) {
    (grid[i] - grid[i - 1], grid[i + 1] - grid[i])
}

/// Second-derivative stencil `d^2/dx^2`.
pub fn second_derivative(grid: &[f64]) -> Result<TridiagonalOperator, FdError> {
    check_grid(grid)?;
    let n = grid.len();
    let mut op = TridiagonalOperator::zeros(n);
    for i in 1..n - 1 {
        let (h_m, h_p) = spacings(grid, i);
        op.set_mid_row(
            i,
            2.0 / (h_m * (h_m + h_p)),
            -2.0 / (h_m * h_p),
            2.0 / (h_p * (h_m + h_p)),
        )?;
    }
    Ok(op)
}

/// Central first-derivative stencil `d/dx`.
pub fn first_derivative(grid: &[f64]) -> Result<TridiagonalOperator, FdError> {
    check_grid(grid)?;
    let n = grid.len();
    let mut op = TridiagonalOperator::zeros(n);
    for i in 1..n - 1 {
        let (h_m, h_p) = spacings(grid, i);
        op.set_mid_row(
            i,
            -h_p / (h_m * (h_m + h_p)),
            (h_p - h_m) / (h_m * h_p),
            h_m / (h_p * (h_m + h_p)),
        )?;
    }
    Ok(op)
}

/// `L = -D d^2/dx^2` for the heat equation `u_t = D u_xx`.
pub fn heat_operator(grid: &[f64], diffusivity: f64) -> Result<TridiagonalOperator, FdError> {
    if !diffusivity.is_finite() || diffusivity < 0.0 {
        return Err(FdError::InvalidInput(
            "diffusivity must be finite and >= 0".to_string(),
        ));
    }
    Ok(second_derivative(grid)?.scaled(-diffusivity))
}

/// Heat operator whose diffusivity follows `diffusivity(t)`.
///
/// The returned operator starts at `t = 0` and is re-evaluated on every `set_time`.
pub fn time_dependent_heat_operator<F>(
    grid: &[f64],
    diffusivity: F,
) -> Result<TridiagonalOperator, FdError>
where
    F: Fn(f64) -> f64 + Send + Sync + 'static,
{
    let d2 = second_derivative(grid)?;
    let (base_l, base_d, base_u) = (d2.lower().to_vec(), d2.diag().to_vec(), d2.upper().to_vec());
    let setter = move |t: f64, lower: &mut [f64], diag: &mut [f64], upper: &mut [f64]| {
        let k = -diffusivity(t);
        for (dst, src) in [(lower, &base_l), (diag, &base_d), (upper, &base_u)] {
            dst.iter_mut().zip(src.iter()).for_each(|(x, b)| *x = k * b);
        }
    };
    let mut op = TridiagonalOperator::zeros(grid.len()).with_time_setter(setter);
    op.set_time(0.0);
    Ok(op)
}

/// Black-Scholes operator in time-to-expiry, `L = -(1/2 s^2 S^2 d2 + (r - q) S d1 - r)`.
///
/// Rolling `V(tau)` forward in `tau` with `I - dt * L` is the backward rollback in
/// calendar time from expiry to valuation.
pub fn black_scholes_operator(
    grid: &[f64],
    rate: f64,
    dividend_yield: f64,
    vol: f64,
) -> Result<TridiagonalOperator, FdError> {
    check_grid(grid)?;
    if !vol.is_finite() || vol <= 0.0 {
        return Err(FdError::InvalidInput(
            "volatility must be finite and > 0".to_string(),
        ));
    }
    let n = grid.len();
    let mut op = TridiagonalOperator::zeros(n);
    for i in 1..n - 1 {
        let s = grid[i];
        let (h_m, h_p) = spacings(grid, i);

        let d1_m = -h_p / (h_m * (h_m + h_p));
        let d1_0 = (h_p - h_m) / (h_m * h_p);
        let d1_p = h_m / (h_p * (h_m + h_p));

        let d2_m = 2.0 / (h_m * (h_m + h_p));
        let d2_0 = -2.0 / (h_m * h_p);
        let d2_p = 2.0 / (h_p * (h_m + h_p));

        let diffusion = 0.5 * vol * vol * s * s;
        let drift = (rate - dividend_yield) * s;

        op.set_mid_row(
            i,
            -(diffusion * d2_m + drift * d1_m),
            -(diffusion * d2_0 + drift * d1_0 - rate),
            -(diffusion * d2_p + drift * d1_p),
        )?;
    }
    Ok(op)
}
