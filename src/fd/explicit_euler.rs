//! Forward-Euler time stepping, `a_{n+1} = (I - dt * L(t_n)) a_n`.
//!
//! The scheme is conditionally stable. For diffusion-type operators the step must
//! satisfy `dt <= O(dx^2)`; the precise bound is `1 / max_i L_ii` for the stencils built
//! in [`operators`](super::operators). Nothing here checks it: a step above the bound
//! makes the state grow without limit instead of reporting an error. Use
//! [`check_explicit_step`](super::stability::check_explicit_step) to validate a step size
//! up front.

use crate::core::FdError;

use super::operator::{LinearOperator, ensure_same_size};
use super::scheme::Scheme;

/// Explicit Euler scheme over any [`LinearOperator`].
///
/// Holds the operator `L`, the identity `I` of the same size, the cached step `dt`, and
/// the explicit part `I - dt * L`. The explicit part is rebuilt on every `set_step`
/// and, for time-dependent operators, on every `step` after moving `L` to the step
/// time, so it never lags behind `dt` or the operator's time.
#[derive(Debug, Clone)]
pub struct ExplicitEuler<O: LinearOperator> {
    l: O,
    identity: O,
    explicit_part: O,
    dt: f64,
    scratch: Vec<f64>,
}

impl<O: LinearOperator> ExplicitEuler<O> {
    /// Wraps `l`; the step size starts at zero and must be set before stepping.
    pub fn new(l: O) -> Result<Self, FdError> {
        let n = l.size();
        let identity = O::identity(n);
        ensure_same_size(n, identity.size())?;
        Ok(Self {
            explicit_part: identity.clone(),
            identity,
            l,
            dt: 0.0,
            scratch: vec![0.0; n],
        })
    }

    /// The governing operator.
    #[inline]
    pub fn operator(&self) -> &O {
        &self.l
    }

    /// The cached `I - dt * L`.
    #[inline]
    pub fn explicit_part(&self) -> &O {
        &self.explicit_part
    }

    fn rebuild(&mut self) -> Result<(), FdError> {
        self.l
            .explicit_part_into(&self.identity, self.dt, &mut self.explicit_part)
    }
}

impl<O: LinearOperator> Scheme for ExplicitEuler<O> {
    #[inline]
    fn size(&self) -> usize {
        self.l.size()
    }

    #[inline]
    fn step_size(&self) -> f64 {
        self.dt
    }

    /// Stores `dt` and rebuilds `I - dt * L` at the operator's current time.
    fn set_step(&mut self, dt: f64) -> Result<(), FdError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(FdError::InvalidInput(format!(
                "step size must be finite and > 0, got {dt}"
            )));
        }
        self.dt = dt;
        self.rebuild()
    }

    fn step(&mut self, state: &mut [f64], t: f64) -> Result<(), FdError> {
        ensure_same_size(self.l.size(), state.len())?;
        if self.dt <= 0.0 {
            return Err(FdError::InvalidInput(
                "step size not set; call set_step before stepping".to_string(),
            ));
        }
        if self.l.is_time_dependent() {
            self.l.set_time(t);
            self.rebuild()?;
        }
        self.explicit_part.apply_into(state, &mut self.scratch);
        state.copy_from_slice(&self.scratch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fd::grid::uniform_grid;
    use crate::fd::operators::heat_operator;
    use crate::fd::tridiagonal::TridiagonalOperator;
    use approx::assert_relative_eq;

    #[test]
    fn step_before_set_step_is_rejected() {
        let op = TridiagonalOperator::identity(3);
        let mut scheme = ExplicitEuler::new(op).unwrap();
        let mut state = [1.0, 2.0, 3.0];
        assert!(scheme.step(&mut state, 0.0).is_err());
        assert_eq!(state, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn invalid_step_sizes_are_rejected() {
        let mut scheme = ExplicitEuler::new(TridiagonalOperator::identity(2)).unwrap();
        assert!(scheme.set_step(0.0).is_err());
        assert!(scheme.set_step(-0.1).is_err());
        assert!(scheme.set_step(f64::NAN).is_err());
        assert_eq!(scheme.step_size(), 0.0);
    }

    #[test]
    fn wrong_state_length_leaves_state_untouched() {
        let mut scheme = ExplicitEuler::new(TridiagonalOperator::identity(3)).unwrap();
        scheme.set_step(0.1).unwrap();
        let mut state = [1.0, 2.0];
        assert_eq!(
            scheme.step(&mut state, 0.0),
            Err(FdError::SizeMismatch {
                expected: 3,
                found: 2
            })
        );
        assert_eq!(state, [1.0, 2.0]);
    }

    #[test]
    fn step_equals_state_minus_dt_times_operator() {
        let grid = uniform_grid(8, 0.0, 1.0).unwrap();
        let op = heat_operator(&grid, 0.2).unwrap();
        let mut scheme = ExplicitEuler::new(op.clone()).unwrap();
        scheme.set_step(1.0e-3).unwrap();

        let mut state = grid.iter().map(|x| x * (1.0 - x)).collect::<Vec<_>>();
        let lv = op.apply_to(&state).unwrap();
        let expected = state
            .iter()
            .zip(&lv)
            .map(|(a, l)| a - 1.0e-3 * l)
            .collect::<Vec<_>>();
        scheme.step(&mut state, 0.0).unwrap();
        for (got, want) in state.iter().zip(&expected) {
            assert_relative_eq!(*got, *want, epsilon = 1e-14);
        }
    }

    #[test]
    fn time_dependent_steps_reuse_explicit_part_storage() {
        let grid = uniform_grid(10, 0.0, 1.0).unwrap();
        let op = crate::fd::operators::time_dependent_heat_operator(&grid, |t| 1.0 + t).unwrap();
        let mut scheme = ExplicitEuler::new(op).unwrap();
        scheme.set_step(1.0e-3).unwrap();
        let bands = (
            scheme.explicit_part().lower().as_ptr(),
            scheme.explicit_part().diag().as_ptr(),
            scheme.explicit_part().upper().as_ptr(),
        );

        let mut state = grid.iter().map(|x| x * (1.0 - x)).collect::<Vec<_>>();
        for k in 0..5 {
            scheme.step(&mut state, 0.1 * k as f64).unwrap();
        }
        assert_eq!(scheme.explicit_part().lower().as_ptr(), bands.0);
        assert_eq!(scheme.explicit_part().diag().as_ptr(), bands.1);
        assert_eq!(scheme.explicit_part().upper().as_ptr(), bands.2);

        // diffusivity 1.4 at the last step time
        let expected = crate::fd::operator::explicit_part(
            &TridiagonalOperator::identity(grid.len()),
            &heat_operator(&grid, 1.4).unwrap(),
            1.0e-3,
        )
        .unwrap();
        for (got, want) in scheme.explicit_part().diag().iter().zip(expected.diag()) {
            assert_relative_eq!(*got, *want, epsilon = 1e-12);
        }
    }

    #[test]
    fn set_step_does_not_move_operator_time() {
        let op = TridiagonalOperator::zeros(2)
            .with_time_setter(|t: f64, _l: &mut [f64], d: &mut [f64], _u: &mut [f64]| {
                d.iter_mut().for_each(|x| *x = t);
            });
        let mut scheme = ExplicitEuler::new(op).unwrap();
        scheme.set_step(0.5).unwrap();
        assert_eq!(scheme.operator().time(), None);
        assert_eq!(scheme.explicit_part().diag(), &[1.0, 1.0]);
    }
}
