//! Time-marching scheme contract used by the stepping driver.

use crate::core::FdError;

/// One-step time discretization of `du/dt = -L u`.
///
/// `set_step` and `step` are driver operations: a
/// [`FiniteDifferenceModel`](super::model::FiniteDifferenceModel) decides the step sizes
/// and the times to step from. They are public so that other schemes can be written
/// outside this crate, not so that callers interleave them with a running rollback.
pub trait Scheme {
    /// Dimension of the state vectors the scheme advances.
    fn size(&self) -> usize;

    /// Currently cached step size; `0.0` until the first `set_step`.
    fn step_size(&self) -> f64;

    /// Caches a new step size `dt > 0`.
    fn set_step(&mut self, dt: f64) -> Result<(), FdError>;

    /// Advances `state` in place by the cached step, starting at time `t`.
    ///
    /// On error `state` must be left untouched.
    fn step(&mut self, state: &mut [f64], t: f64) -> Result<(), FdError>;
}
