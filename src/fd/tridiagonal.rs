//! Banded tridiagonal operator, the workhorse of 1-D finite-difference stencils.

use std::sync::Arc;

use crate::core::FdError;

use super::operator::{LinearOperator, ensure_same_size};

/// Rewrites the bands of a [`TridiagonalOperator`] for a given time.
///
/// Implemented for any `Fn(t, lower, diag, upper)` closure that is `Send + Sync`.
pub trait TimeSetter: Send + Sync {
    /// Overwrites the bands with their values at `t`.
    fn set_time(&self, t: f64, lower: &mut [f64], diag: &mut [f64], upper: &mut [f64]);
}

impl<F> TimeSetter for F
where
    F: Fn(f64, &mut [f64], &mut [f64], &mut [f64]) + Send + Sync,
{
    fn set_time(&self, t: f64, lower: &mut [f64], diag: &mut [f64], upper: &mut [f64]) {
        self(t, lower, diag, upper)
    }
}

/// Tridiagonal operator with bands stored as three length-`N` vectors.
///
/// Row `i` reads `lower[i] * v[i-1] + diag[i] * v[i] + upper[i] * v[i+1]`; `lower[0]` and
/// `upper[N-1]` are ignored. Application costs O(N).
///
/// A [`TimeSetter`] makes the operator time dependent. The setter is shared between
/// clones but holds no mutable state, so clones remain independent. Algebra results
/// are snapshots taken at the operands' current time and carry no setter.
#[derive(Clone)]
pub struct TridiagonalOperator {
    lower: Vec<f64>,
    diag: Vec<f64>,
    upper: Vec<f64>,
    time: Option<f64>,
    time_setter: Option<Arc<dyn TimeSetter>>,
}

impl std::fmt::Debug for TridiagonalOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TridiagonalOperator")
            .field("lower", &self.lower)
            .field("diag", &self.diag)
            .field("upper", &self.upper)
            .field("time", &self.time)
            .field("time_dependent", &self.time_setter.is_some())
            .finish()
    }
}

impl TridiagonalOperator {
    /// Zero operator of size `n`.
    pub fn zeros(n: usize) -> Self {
        Self {
            lower: vec![0.0; n],
            diag: vec![0.0; n],
            upper: vec![0.0; n],
            time: None,
            time_setter: None,
        }
    }

    /// Builds an operator from its bands, which must have equal length.
    pub fn from_bands(lower: Vec<f64>, diag: Vec<f64>, upper: Vec<f64>) -> Result<Self, FdError> {
        ensure_same_size(diag.len(), lower.len())?;
        ensure_same_size(diag.len(), upper.len())?;
        if lower
            .iter()
            .chain(&diag)
            .chain(&upper)
            .any(|x| !x.is_finite())
        {
            return Err(FdError::InvalidInput(
                "tridiagonal bands must be finite".to_string(),
            ));
        }
        Ok(Self {
            lower,
            diag,
            upper,
            time: None,
            time_setter: None,
        })
    }

    /// Attaches a time setter; the operator becomes time dependent.
    pub fn with_time_setter<T: TimeSetter + 'static>(mut self, setter: T) -> Self {
        self.time_setter = Some(Arc::new(setter));
        self
    }

    #[inline]
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    #[inline]
    pub fn diag(&self) -> &[f64] {
        &self.diag
    }

    #[inline]
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Time the bands were last evaluated at, if a setter ever ran.
    #[inline]
    pub fn time(&self) -> Option<f64> {
        self.time
    }

    /// Overwrites interior row `i` (`0 < i < N-1`).
    pub fn set_mid_row(&mut self, i: usize, l: f64, d: f64, u: f64) -> Result<(), FdError> {
        let n = self.size();
        if i == 0 || i + 1 >= n {
            return Err(FdError::InvalidInput(format!(
                "row {i} is not an interior row of a size-{n} operator"
            )));
        }
        self.lower[i] = l;
        self.diag[i] = d;
        self.upper[i] = u;
        Ok(())
    }

    /// `L + rhs`, failing when the sizes differ.
    pub fn try_add(&self, rhs: &Self) -> Result<Self, FdError> {
        self.zip_bands(rhs, |x, y| x + y)
    }

    fn zip_bands(&self, rhs: &Self, f: impl Fn(f64, f64) -> f64) -> Result<Self, FdError> {
        ensure_same_size(self.size(), rhs.size())?;
        let zip = |a: &[f64], b: &[f64]| a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect();
        Ok(Self {
            lower: zip(&self.lower, &rhs.lower),
            diag: zip(&self.diag, &rhs.diag),
            upper: zip(&self.upper, &rhs.upper),
            time: None,
            time_setter: None,
        })
    }
}

impl LinearOperator for TridiagonalOperator {
    #[inline]
    fn size(&self) -> usize {
        self.diag.len()
    }

    #[inline]
    fn is_time_dependent(&self) -> bool {
        self.time_setter.is_some()
    }

    fn set_time(&mut self, t: f64) {
        if let Some(setter) = &self.time_setter {
            setter.set_time(t, &mut self.lower, &mut self.diag, &mut self.upper);
            self.time = Some(t);
        }
    }

    fn apply_into(&self, v: &[f64], out: &mut [f64]) {
        let n = self.size();
        debug_assert_eq!(v.len(), n);
        debug_assert_eq!(out.len(), n);
        match n {
            0 => {}
            1 => out[0] = self.diag[0] * v[0],
            _ => {
                out[0] = self.diag[0].mul_add(v[0], self.upper[0] * v[1]);
                for i in 1..n - 1 {
                    out[i] = self.lower[i].mul_add(
                        v[i - 1],
                        self.diag[i].mul_add(v[i], self.upper[i] * v[i + 1]),
                    );
                }
                out[n - 1] = self.lower[n - 1].mul_add(v[n - 2], self.diag[n - 1] * v[n - 1]);
            }
        }
    }

    fn identity(size: usize) -> Self {
        Self {
            lower: vec![0.0; size],
            diag: vec![1.0; size],
            upper: vec![0.0; size],
            time: None,
            time_setter: None,
        }
    }

    fn scaled(&self, factor: f64) -> Self {
        let scale = |band: &[f64]| band.iter().map(|x| factor * x).collect();
        Self {
            lower: scale(&self.lower),
            diag: scale(&self.diag),
            upper: scale(&self.upper),
            time: None,
            time_setter: None,
        }
    }

    fn try_sub(&self, rhs: &Self) -> Result<Self, FdError> {
        self.zip_bands(rhs, |x, y| x - y)
    }

    /// Writes `identity - dt * self` into the bands of `out` without reallocating.
    fn explicit_part_into(&self, identity: &Self, dt: f64, out: &mut Self) -> Result<(), FdError> {
        ensure_same_size(self.size(), identity.size())?;
        ensure_same_size(self.size(), out.size())?;
        for (dst, id, src) in [
            (&mut out.lower, &identity.lower, &self.lower),
            (&mut out.diag, &identity.diag, &self.diag),
            (&mut out.upper, &identity.upper, &self.upper),
        ] {
            for ((o, &i), &l) in dst.iter_mut().zip(id.iter()).zip(src.iter()) {
                *o = (-dt).mul_add(l, i);
            }
        }
        out.time = None;
        out.time_setter = None;
        Ok(())
    }

    fn stability_dt_max(&self) -> Option<f64> {
        let dt_max = self
            .diag
            .iter()
            .filter(|&&d| d > 1.0e-14)
            .map(|d| 1.0 / d)
            .fold(f64::INFINITY, f64::min);
        (dt_max.is_finite() && dt_max > 0.0).then_some(dt_max)
    }
}
