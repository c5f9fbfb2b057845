//! Time grids with stopping-time flags.

use crate::core::FdError;

/// Two times closer than this (relative to their magnitude) are the same grid point.
pub const TIME_TOLERANCE: f64 = 1.0e-10;

#[inline]
pub(crate) fn same_time(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIME_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// Strictly increasing list of times; some of them are stopping times.
///
/// Grids may be given in either order but are stored ascending; the stepping driver
/// decides the direction of travel.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<f64>,
    stopping: Vec<bool>,
}

impl TimeGrid {
    /// Builds a grid from explicit points.
    ///
    /// `times` must be strictly monotonic (ascending or descending) and finite.
    /// Every entry of `stopping_times` must coincide with a grid point.
    pub fn from_times(mut times: Vec<f64>, stopping_times: &[f64]) -> Result<Self, FdError> {
        if times.is_empty() {
            return Err(FdError::InvalidInput("time grid is empty".to_string()));
        }
        if times.iter().any(|t| !t.is_finite()) {
            return Err(FdError::InvalidInput(
                "time grid points must be finite".to_string(),
            ));
        }
        if times.len() > 1 && times[0] > times[1] {
            times.reverse();
        }
        if times.windows(2).any(|w| w[1] <= w[0] || same_time(w[0], w[1])) {
            return Err(FdError::InvalidInput(
                "time grid must be strictly monotonic".to_string(),
            ));
        }

        let mut stopping = vec![false; times.len()];
        for &s in stopping_times {
            let idx = index_of(&times, s).ok_or_else(|| {
                FdError::InvalidInput(format!("stopping time {s} is not a grid point"))
            })?;
            stopping[idx] = true;
        }
        Ok(Self { times, stopping })
    }

    /// `steps` equal steps between `start` and `end` (either order), no stopping times.
    pub fn uniform(start: f64, end: f64, steps: usize) -> Result<Self, FdError> {
        Self::with_stopping_times(start, end, steps, &[])
    }

    /// Uniform grid of `steps` steps with `stopping_times` merged in as mandatory points.
    ///
    /// Each segment between consecutive mandatory points gets
    /// `ceil(segment / dt)` equal steps, `dt = |end - start| / steps`, so the largest step
    /// never exceeds the nominal one. Stopping times outside `[start, end]` are rejected.
    pub fn with_stopping_times(
        start: f64,
        end: f64,
        steps: usize,
        stopping_times: &[f64],
    ) -> Result<Self, FdError> {
        if steps == 0 {
            return Err(FdError::InvalidInput(
                "time grid needs at least one step".to_string(),
            ));
        }
        if !start.is_finite() || !end.is_finite() || same_time(start, end) {
            return Err(FdError::InvalidInput(
                "time grid bounds must be finite and distinct".to_string(),
            ));
        }
        let (lo, hi) = (start.min(end), start.max(end));
        if let Some(&bad) = stopping_times
            .iter()
            .find(|&&s| !s.is_finite() || (s < lo && !same_time(s, lo)) || (s > hi && !same_time(s, hi)))
        {
            return Err(FdError::InvalidInput(format!(
                "stopping time {bad} lies outside [{lo}, {hi}]"
            )));
        }

        let mut mandatory = Vec::with_capacity(stopping_times.len() + 2);
        mandatory.push(lo);
        mandatory.extend(stopping_times.iter().map(|&s| s.clamp(lo, hi)));
        mandatory.push(hi);
        mandatory.sort_by(f64::total_cmp);
        mandatory.dedup_by(|a, b| same_time(*a, *b));

        let dt = (hi - lo) / steps as f64;
        let mut times = vec![lo];
        for w in mandatory.windows(2) {
            let segment = w[1] - w[0];
            let n = ((segment / dt) - TIME_TOLERANCE).ceil().max(1.0) as usize;
            let h = segment / n as f64;
            times.extend((1..n).map(|k| w[0] + k as f64 * h));
            times.push(w[1]);
        }

        let stopping_points = stopping_times
            .iter()
            .map(|&s| s.clamp(lo, hi))
            .collect::<Vec<_>>();
        Self::from_times(times, &stopping_points)
    }

    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    #[inline]
    pub fn start(&self) -> f64 {
        self.times[0]
    }

    #[inline]
    pub fn end(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// Whether `t` coincides with a stopping time.
    pub fn is_stopping_time(&self, t: f64) -> bool {
        index_of(&self.times, t).is_some_and(|i| self.stopping[i])
    }

    /// Stopping times in ascending order.
    pub fn stopping_times(&self) -> Vec<f64> {
        self.times
            .iter()
            .zip(&self.stopping)
            .filter_map(|(&t, &s)| s.then_some(t))
            .collect()
    }

    /// Index of the grid point coinciding with `t`.
    pub fn index_of(&self, t: f64) -> Option<usize> {
        index_of(&self.times, t)
    }

    /// Whether `t` lies in `[start, end]` up to the time tolerance.
    pub fn covers(&self, t: f64) -> bool {
        (t >= self.start() || same_time(t, self.start()))
            && (t <= self.end() || same_time(t, self.end()))
    }
}

fn index_of(times: &[f64], t: f64) -> Option<usize> {
    let hi = times.partition_point(|&x| x < t);
    [hi.checked_sub(1), Some(hi)]
        .into_iter()
        .flatten()
        .filter(|&i| i < times.len())
        .find(|&i| same_time(times[i], t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn descending_input_is_stored_ascending() {
        let grid = TimeGrid::from_times(vec![1.0, 0.5, 0.0], &[0.5]).unwrap();
        assert_eq!(grid.times(), &[0.0, 0.5, 1.0]);
        assert!(grid.is_stopping_time(0.5));
        assert!(!grid.is_stopping_time(1.0));
        assert_eq!(grid.stopping_times(), vec![0.5]);
    }

    #[test]
    fn rejects_non_monotonic_and_unknown_stopping_times() {
        assert!(TimeGrid::from_times(vec![], &[]).is_err());
        assert!(TimeGrid::from_times(vec![0.0, 1.0, 0.5], &[]).is_err());
        assert!(TimeGrid::from_times(vec![0.0, 0.0], &[]).is_err());
        assert!(TimeGrid::from_times(vec![0.0, 1.0], &[0.3]).is_err());
        assert!(TimeGrid::from_times(vec![0.0, f64::NAN], &[]).is_err());
    }

    #[test]
    fn uniform_grid_has_requested_steps() {
        let grid = TimeGrid::uniform(1.0, 0.0, 4).unwrap();
        assert_eq!(grid.len(), 5);
        assert_relative_eq!(grid.times()[1] - grid.times()[0], 0.25);
        assert!(grid.stopping_times().is_empty());
        assert!(TimeGrid::uniform(0.0, 1.0, 0).is_err());
        assert!(TimeGrid::uniform(1.0, 1.0, 3).is_err());
    }

    #[test]
    fn stopping_times_become_grid_points_without_longer_steps() {
        let grid = TimeGrid::with_stopping_times(0.0, 1.0, 10, &[0.33, 0.5]).unwrap();
        assert!(grid.index_of(0.33).is_some());
        assert!(grid.is_stopping_time(0.33));
        assert!(grid.is_stopping_time(0.5));
        assert!(!grid.is_stopping_time(0.0));
        for w in grid.times().windows(2) {
            assert!(w[1] - w[0] <= 0.1 + 1e-12);
        }
        assert!(TimeGrid::with_stopping_times(0.0, 1.0, 10, &[1.5]).is_err());
    }

    #[test]
    fn endpoint_stopping_times_are_flagged() {
        let grid = TimeGrid::with_stopping_times(0.0, 1.0, 4, &[1.0]).unwrap();
        assert_eq!(grid.len(), 5);
        assert_eq!(grid.stopping_times(), vec![1.0]);
        assert!(grid.covers(1.0 + 1e-13));
        assert!(!grid.covers(1.1));
    }
}
