//! Optional stability diagnostics for explicit stepping.
//!
//! Kept off the stepping path: schemes never call into this module.

use crate::core::FdError;

use super::operator::LinearOperator;

/// Outcome of checking a candidate explicit step against an operator's bound.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StabilityReport {
    /// Candidate step size.
    pub dt: f64,
    /// Bound after the safety factor.
    pub dt_max: f64,
    /// `dt <= dt_max`.
    pub stable: bool,
}

impl StabilityReport {
    /// `dt / dt_max`; above one means the explicit scheme will diverge.
    #[inline]
    pub fn ratio(&self) -> f64 {
        self.dt / self.dt_max
    }
}

/// Compares `dt` with `safety * op.stability_dt_max()`.
///
/// Fails when the operator cannot estimate a bound.
pub fn check_explicit_step<O: LinearOperator>(
    op: &O,
    dt: f64,
    safety: f64,
) -> Result<StabilityReport, FdError> {
    if !safety.is_finite() || safety <= 0.0 {
        return Err(FdError::InvalidInput(
            "cfl_safety_factor must be finite and > 0".to_string(),
        ));
    }
    if !dt.is_finite() || dt <= 0.0 {
        return Err(FdError::InvalidInput(
            "step size must be finite and > 0".to_string(),
        ));
    }
    let dt_max = op
        .stability_dt_max()
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| {
            FdError::NumericalError("unable to compute a positive CFL bound".to_string())
        })?
        * safety;
    Ok(StabilityReport {
        dt,
        dt_max,
        stable: dt <= dt_max,
    })
}

/// Smallest number of equal steps over `span` that keeps each step below `dt_max`.
pub fn min_stable_steps(span: f64, dt_max: f64) -> Result<usize, FdError> {
    if !span.is_finite() || !dt_max.is_finite() || dt_max <= 0.0 {
        return Err(FdError::InvalidInput(
            "span and dt_max must be finite with dt_max > 0".to_string(),
        ));
    }
    Ok(((span.abs() / dt_max).ceil() as usize).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fd::grid::uniform_grid;
    use crate::fd::operators::heat_operator;
    use crate::fd::tridiagonal::TridiagonalOperator;
    use approx::assert_relative_eq;

    #[test]
    fn report_flags_steps_above_the_bound() {
        let grid = uniform_grid(10, 0.0, 1.0).unwrap();
        let op = heat_operator(&grid, 1.0).unwrap();
        let ok = check_explicit_step(&op, 0.004, 0.9).unwrap();
        assert!(ok.stable);
        assert_relative_eq!(ok.dt_max, 0.0045, epsilon = 1e-12);
        let bad = check_explicit_step(&op, 0.006, 1.0).unwrap();
        assert!(!bad.stable);
        assert!(bad.ratio() > 1.0);
    }

    #[test]
    fn operators_without_estimate_are_reported() {
        let op = TridiagonalOperator::zeros(4);
        assert!(matches!(
            check_explicit_step(&op, 0.1, 1.0),
            Err(FdError::NumericalError(_))
        ));
    }

    #[test]
    fn min_steps_rounds_up() {
        assert_eq!(min_stable_steps(1.0, 0.3).unwrap(), 4);
        assert_eq!(min_stable_steps(-1.0, 0.5).unwrap(), 2);
        assert!(min_stable_steps(1.0, 0.0).is_err());
    }
}
