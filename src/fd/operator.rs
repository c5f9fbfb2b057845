//! Discretized linear spatial operators.
//!
//! A [`LinearOperator`] is an `N x N` linear map acting on a state vector sampled on a
//! spatial grid. It is never materialized as a dense matrix: implementations expose
//! their size, whether their coefficients depend on time, and a matrix-vector product.
//! The small algebra (`identity`, `scaled`, `try_sub`) is exactly what a time-stepping
//! formula such as `I - dt * L` needs.
//!
//! Sign convention: schemes march `a_{n+1} = (I - dt * L) a_n`, so for a diffusion
//! `u_t = D u_xx` the operator is `L = -D d^2/dx^2`, and for a Black-Scholes rollback in
//! time-to-expiry it is minus the generator.

use crate::core::FdError;

/// Linear operator on a fixed-size state vector.
///
/// Implementations are value types: cloning must produce an independent operator, and
/// nothing may be shared mutably between clones. This is what lets independent
/// stepping sessions run on different threads.
pub trait LinearOperator: Clone {
    /// Dimension `N` of the state vectors the operator acts on.
    fn size(&self) -> usize;

    /// Whether the coefficients vary with the evaluation time.
    ///
    /// Must not change over the lifetime of the operator.
    fn is_time_dependent(&self) -> bool {
        false
    }

    /// Moves the coefficients to their value at `t`.
    ///
    /// Time-independent operators ignore the call.
    fn set_time(&mut self, _t: f64) {}

    /// Writes `L * v` into `out` without touching `v`.
    ///
    /// Both slices must have length [`size`](Self::size); this is the allocation-free
    /// form used on the stepping path and is not length-checked in release builds.
    fn apply_into(&self, v: &[f64], out: &mut [f64]);

    /// Returns `L * v` as a new vector.
    fn apply_to(&self, v: &[f64]) -> Result<Vec<f64>, FdError> {
        ensure_same_size(self.size(), v.len())?;
        let mut out = vec![0.0_f64; v.len()];
        self.apply_into(v, &mut out);
        Ok(out)
    }

    /// Multiplicative identity of dimension `size`.
    fn identity(size: usize) -> Self;

    /// `factor * L`.
    fn scaled(&self, factor: f64) -> Self;

    /// `L - rhs`, failing when the sizes differ.
    fn try_sub(&self, rhs: &Self) -> Result<Self, FdError>;

    /// Overwrites `out` with `identity - dt * self`.
    ///
    /// Called on every step of a time-dependent scheme. The default builds a fresh
    /// operator; implementations with owned storage should reuse `out`'s buffers.
    fn explicit_part_into(&self, identity: &Self, dt: f64, out: &mut Self) -> Result<(), FdError> {
        *out = explicit_part(identity, self, dt)?;
        Ok(())
    }

    /// Largest explicit-Euler step the operator tolerates, if it can estimate one.
    fn stability_dt_max(&self) -> Option<f64> {
        None
    }
}

/// Fails with [`FdError::SizeMismatch`] unless `found == expected`.
#[inline]
pub fn ensure_same_size(expected: usize, found: usize) -> Result<(), FdError> {
    if expected == found {
        Ok(())
    } else {
        Err(FdError::SizeMismatch { expected, found })
    }
}

/// Builds `I - dt * L`.
pub fn explicit_part<O: LinearOperator>(identity: &O, op: &O, dt: f64) -> Result<O, FdError> {
    identity.try_sub(&op.scaled(dt))
}
