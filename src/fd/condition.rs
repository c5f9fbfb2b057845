//! Step conditions: path constraints applied to the state between steps.

use crate::core::FdError;

use super::time_grid::same_time;

/// Constraint applied by the stepping driver after a step, e.g. early-exercise
/// projection or barrier knock-out.
///
/// Implemented for closures `FnMut(&mut [f64], f64) -> Result<(), FdError>`.
pub trait StepCondition {
    /// Projects `state` at time `t`.
    fn apply_to(&mut self, state: &mut [f64], t: f64) -> Result<(), FdError>;
}

impl<F> StepCondition for F
where
    F: FnMut(&mut [f64], f64) -> Result<(), FdError>,
{
    fn apply_to(&mut self, state: &mut [f64], t: f64) -> Result<(), FdError> {
        self(state, t)
    }
}

/// When the driver applies a registered condition.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ConditionTiming {
    /// After every step.
    EveryStep,
    /// Only after the step that lands on a stopping time of the grid.
    StoppingTimes,
    /// Only after the step that lands on this stopping time.
    At(f64),
}

/// Ordered collection of step conditions.
///
/// Conditions due at the same time run in registration order.
#[derive(Default)]
pub struct StepConditionSet<'a> {
    entries: Vec<(ConditionTiming, Box<dyn StepCondition + 'a>)>,
}

impl std::fmt::Debug for StepConditionSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(timing, _)| timing))
            .finish()
    }
}

impl<'a> StepConditionSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a condition applied at stopping times.
    pub fn push<C: StepCondition + 'a>(&mut self, condition: C) -> &mut Self {
        self.push_with(ConditionTiming::StoppingTimes, condition)
    }

    /// Registers a condition applied after every step.
    pub fn push_every_step<C: StepCondition + 'a>(&mut self, condition: C) -> &mut Self {
        self.push_with(ConditionTiming::EveryStep, condition)
    }

    /// Registers a condition applied once, at stopping time `t`.
    ///
    /// `t` must be a stopping time of the grid the driver walks; otherwise the
    /// condition never fires.
    pub fn push_at<C: StepCondition + 'a>(&mut self, t: f64, condition: C) -> &mut Self {
        self.push_with(ConditionTiming::At(t), condition)
    }

    pub fn push_with<C: StepCondition + 'a>(
        &mut self,
        timing: ConditionTiming,
        condition: C,
    ) -> &mut Self {
        self.entries.push((timing, Box::new(condition)));
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_due(timing: ConditionTiming, t: f64, at_stopping_time: bool) -> bool {
        match timing {
            ConditionTiming::EveryStep => true,
            ConditionTiming::StoppingTimes => at_stopping_time,
            ConditionTiming::At(at) => at_stopping_time && same_time(at, t),
        }
    }

    /// Applies every due condition to `state` as one unit.
    ///
    /// Conditions run on `scratch`, a copy of `state`; the result is committed only when
    /// all of them succeed, so a failure leaves `state` as it was. Returns the number of
    /// conditions applied.
    pub(crate) fn apply_due(
        &mut self,
        state: &mut [f64],
        scratch: &mut Vec<f64>,
        t: f64,
        at_stopping_time: bool,
    ) -> Result<usize, FdError> {
        if !self
            .entries
            .iter()
            .any(|(timing, _)| Self::is_due(*timing, t, at_stopping_time))
        {
            return Ok(0);
        }

        scratch.clear();
        scratch.extend_from_slice(state);
        let mut applied = 0;
        for (timing, condition) in &mut self.entries {
            if !Self::is_due(*timing, t, at_stopping_time) {
                continue;
            }
            condition.apply_to(scratch, t).map_err(|err| match err {
                FdError::ConditionFailed { .. } => err,
                other => FdError::ConditionFailed {
                    time: t,
                    reason: other.to_string(),
                },
            })?;
            applied += 1;
        }
        state.copy_from_slice(scratch);
        Ok(applied)
    }
}

/// Early-exercise projection, `v_i = max(v_i, payoff_i)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseProjection {
    payoff: Vec<f64>,
}

impl ExerciseProjection {
    pub fn new(payoff: Vec<f64>) -> Self {
        Self { payoff }
    }

    #[inline]
    pub fn payoff(&self) -> &[f64] {
        &self.payoff
    }
}

impl StepCondition for ExerciseProjection {
    fn apply_to(&mut self, state: &mut [f64], t: f64) -> Result<(), FdError> {
        if state.len() != self.payoff.len() {
            return Err(FdError::ConditionFailed {
                time: t,
                reason: format!(
                    "payoff has {} nodes, state has {}",
                    self.payoff.len(),
                    state.len()
                ),
            });
        }
        for (v, &p) in state.iter_mut().zip(&self.payoff) {
            *v = v.max(p);
        }
        Ok(())
    }
}

type BoundaryFn<'a> = Box<dyn Fn(f64) -> f64 + Send + Sync + 'a>;

/// Writes time-dependent Dirichlet values into the first and/or last node.
pub struct DirichletBoundary<'a> {
    lower: Option<BoundaryFn<'a>>,
    upper: Option<BoundaryFn<'a>>,
}

impl std::fmt::Debug for DirichletBoundary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirichletBoundary")
            .field("lower", &self.lower.is_some())
            .field("upper", &self.upper.is_some())
            .finish()
    }
}

impl<'a> DirichletBoundary<'a> {
    pub fn new() -> Self {
        Self {
            lower: None,
            upper: None,
        }
    }

    /// Value of the first node as a function of time.
    pub fn with_lower<F: Fn(f64) -> f64 + Send + Sync + 'a>(mut self, f: F) -> Self {
        self.lower = Some(Box::new(f));
        self
    }

    /// Value of the last node as a function of time.
    pub fn with_upper<F: Fn(f64) -> f64 + Send + Sync + 'a>(mut self, f: F) -> Self {
        self.upper = Some(Box::new(f));
        self
    }
}

impl Default for DirichletBoundary<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl StepCondition for DirichletBoundary<'_> {
    fn apply_to(&mut self, state: &mut [f64], t: f64) -> Result<(), FdError> {
        let n = state.len();
        if n == 0 {
            return Ok(());
        }
        for (value, idx) in [(&self.lower, 0), (&self.upper, n - 1)] {
            if let Some(f) = value {
                let v = f(t);
                if !v.is_finite() {
                    return Err(FdError::ConditionFailed {
                        time: t,
                        reason: format!("non-finite boundary value at node {idx}"),
                    });
                }
                state[idx] = v;
            }
        }
        Ok(())
    }
}
