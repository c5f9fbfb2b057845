//! Rollback driver: walks a time grid, delegates each step to a [`Scheme`], and applies
//! step conditions between steps.

use log::{debug, trace};

use crate::core::FdError;

use super::condition::StepConditionSet;
use super::operator::ensure_same_size;
use super::scheme::Scheme;
use super::time_grid::{TimeGrid, same_time};

/// Lifecycle of a rollback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No rollback started yet.
    Idle,
    /// A rollback is in progress.
    Stepping,
    /// The last rollback reached its target time.
    Done,
    /// The last rollback stopped on an error; the state vector holds the value after the
    /// last completed step.
    Aborted,
}

/// Finite-difference model driving a scheme across a time grid.
///
/// Stepping is strictly sequential: step `n + 1` starts only after the conditions due
/// after step `n` have been applied, since it reads the projected state. The model keeps
/// no reference to the caller's state between calls.
#[derive(Debug, Clone)]
pub struct FiniteDifferenceModel<S: Scheme> {
    scheme: S,
    max_step: Option<f64>,
    session: SessionState,
    current_time: Option<f64>,
    steps_taken: usize,
    scratch: Vec<f64>,
}

impl<S: Scheme> FiniteDifferenceModel<S> {
    pub fn new(scheme: S) -> Self {
        Self {
            scratch: Vec::with_capacity(scheme.size()),
            scheme,
            max_step: None,
            session: SessionState::Idle,
            current_time: None,
            steps_taken: 0,
        }
    }

    /// Splits grid intervals longer than `max_step` into equal sub-steps.
    ///
    /// Typically set to a stability bound from
    /// [`check_explicit_step`](super::stability::check_explicit_step).
    pub fn with_max_step(mut self, max_step: f64) -> Result<Self, FdError> {
        if !max_step.is_finite() || max_step <= 0.0 {
            return Err(FdError::InvalidInput(
                "max_step must be finite and > 0".to_string(),
            ));
        }
        self.max_step = Some(max_step);
        Ok(self)
    }

    #[inline]
    pub fn scheme(&self) -> &S {
        &self.scheme
    }

    #[inline]
    pub fn scheme_mut(&mut self) -> &mut S {
        &mut self.scheme
    }

    #[inline]
    pub fn session_state(&self) -> SessionState {
        self.session
    }

    /// Time reached by the last completed step of the current or last rollback.
    #[inline]
    pub fn current_time(&self) -> Option<f64> {
        self.current_time
    }

    /// Steps taken by the current or last rollback.
    #[inline]
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// Advances `state` in place from `from` to `to` over the points of `grid`.
    ///
    /// The direction follows the sign of `to - from`. The walk visits `from`, every grid
    /// point strictly between the two, and `to`; both ends must lie within the grid span.
    /// For each interval `[t_k, t_{k+1}]` the scheme steps from `t_k` (split into equal
    /// sub-steps when `max_step` is set, with `set_step` called only when the step size
    /// changes). After the step reaching `t_{k+1}`, `conditions` registered for every
    /// step run, plus those registered for stopping times when `t_{k+1}` is one; all in
    /// registration order. Conditions are not applied at `from`.
    ///
    /// On error the session is [`SessionState::Aborted`] and `state` keeps the value of
    /// the last completed step.
    pub fn rollback(
        &mut self,
        state: &mut [f64],
        from: f64,
        to: f64,
        grid: &TimeGrid,
        conditions: &mut StepConditionSet<'_>,
    ) -> Result<(), FdError> {
        self.steps_taken = 0;
        self.current_time = None;
        self.session = SessionState::Stepping;
        let outcome = self.rollback_impl(state, from, to, grid, conditions);
        self.session = match outcome {
            Ok(()) => SessionState::Done,
            Err(_) => SessionState::Aborted,
        };
        if let Err(err) = &outcome {
            debug!(
                "rollback aborted after {} steps at t={:?}: {err}",
                self.steps_taken, self.current_time
            );
        }
        outcome
    }

    /// Rolls back over `steps` equal steps from `from` to `to`, with `stopping_times`
    /// inserted as extra grid points where `conditions` registered for stopping times
    /// fire.
    ///
    /// As with [`rollback`](Self::rollback), `from == to` is a successful no-op.
    pub fn rollback_uniform(
        &mut self,
        state: &mut [f64],
        from: f64,
        to: f64,
        steps: usize,
        stopping_times: &[f64],
        conditions: &mut StepConditionSet<'_>,
    ) -> Result<(), FdError> {
        let grid = if same_time(from, to) && from.is_finite() && steps > 0 {
            TimeGrid::from_times(vec![from], &[])
        } else {
            TimeGrid::with_stopping_times(from, to, steps, stopping_times)
        };
        let grid = match grid {
            Ok(grid) => grid,
            Err(err) => {
                self.steps_taken = 0;
                self.current_time = None;
                self.session = SessionState::Aborted;
                return Err(err);
            }
        };
        self.rollback(state, from, to, &grid, conditions)
    }

    fn rollback_impl(
        &mut self,
        state: &mut [f64],
        from: f64,
        to: f64,
        grid: &TimeGrid,
        conditions: &mut StepConditionSet<'_>,
    ) -> Result<(), FdError> {
        ensure_same_size(self.scheme.size(), state.len())?;
        if grid.is_empty() {
            return Err(FdError::InvalidInput("time grid is empty".to_string()));
        }
        if !from.is_finite() || !to.is_finite() {
            return Err(FdError::InvalidInput(
                "rollback times must be finite".to_string(),
            ));
        }
        if !grid.covers(from) || !grid.covers(to) {
            return Err(FdError::InvalidInput(format!(
                "rollback [{from}, {to}] is not covered by the time grid [{}, {}]",
                grid.start(),
                grid.end()
            )));
        }
        self.current_time = Some(from);
        if same_time(from, to) {
            return Ok(());
        }

        let points = path(grid, from, to);
        debug!(
            "rollback {from} -> {to}: {} intervals, {} conditions",
            points.len() - 1,
            conditions.len()
        );

        for w in points.windows(2) {
            let (t0, t1) = (w[0], w[1]);
            let span = t1 - t0;
            let substeps = self
                .max_step
                .map_or(1, |m| ((span.abs() / m) - 1.0e-10).ceil().max(1.0) as usize);
            let dt = span.abs() / substeps as f64;
            if (dt - self.scheme.step_size()).abs() > 1.0e-12 * dt {
                self.scheme.set_step(dt)?;
            }
            let stopping = grid.is_stopping_time(t1);

            for k in 0..substeps {
                let t = t0 + span * (k as f64 / substeps as f64);
                let next = if k + 1 == substeps {
                    t1
                } else {
                    t0 + span * ((k + 1) as f64 / substeps as f64)
                };
                self.scheme.step(state, t)?;
                self.steps_taken += 1;
                self.current_time = Some(next);

                let applied = conditions.apply_due(
                    state,
                    &mut self.scratch,
                    next,
                    stopping && k + 1 == substeps,
                )?;
                trace!("step {} to t={next}: dt={dt}, {applied} conditions", self.steps_taken);
            }
        }
        Ok(())
    }
}

/// `from`, the grid points strictly between `from` and `to` in travel order, then `to`.
fn path(grid: &TimeGrid, from: f64, to: f64) -> Vec<f64> {
    let between = |t: f64| {
        let (lo, hi) = (from.min(to), from.max(to));
        t > lo && t < hi && !same_time(t, lo) && !same_time(t, hi)
    };
    let mut points = Vec::with_capacity(grid.len() + 2);
    points.push(from);
    if to > from {
        points.extend(grid.times().iter().copied().filter(|&t| between(t)));
    } else {
        points.extend(grid.times().iter().rev().copied().filter(|&t| between(t)));
    }
    points.push(to);
    points
}
