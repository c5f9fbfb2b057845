//! `ferric_fd` is a finite-difference engine for linear parabolic PDEs of the kind that
//! arise in option pricing.
//!
//! The crate is built from three layers:
//! - a [`LinearOperator`](fd::LinearOperator) contract for discretized spatial operators,
//!   with the algebra (`identity`, `scaled`, `try_sub`) needed by time-stepping formulas;
//! - the explicit Euler scheme [`ExplicitEuler`](fd::ExplicitEuler),
//!   `a_{n+1} = (I - dt * L(t_n)) a_n`, behind the [`Scheme`](fd::Scheme) trait;
//! - the [`FiniteDifferenceModel`](fd::FiniteDifferenceModel) driver that rolls a
//!   caller-owned state vector across a [`TimeGrid`](fd::TimeGrid), applying
//!   [`StepCondition`](fd::StepCondition)s such as early-exercise projection.
//!
//! [`engines::pde::ExplicitFdEngine`] puts them together into a Black-Scholes vanilla
//! pricer.
//!
//! Numerical considerations:
//! - Explicit stepping is conditionally stable. A step above the operator's bound is not
//!   reported by the scheme; the state diverges instead. Check candidate steps with
//!   [`check_explicit_step`](fd::check_explicit_step) or cap them with
//!   [`FiniteDifferenceModel::with_max_step`](fd::FiniteDifferenceModel::with_max_step).
//! - Operators, schemes and drivers are plain values without shared mutable state, so
//!   independent valuations can run on separate threads.
//!
//! # Feature Flags
//! - `parallel`: enables Rayon-powered batch pricing.
//!
//! # Quick Start
//! Price a European put with the explicit engine:
//! ```rust
//! use ferric_fd::core::PricingEngine;
//! use ferric_fd::engines::pde::ExplicitFdEngine;
//! use ferric_fd::instruments::VanillaOption;
//! use ferric_fd::market::Market;
//!
//! let market = Market::builder()
//!     .spot(100.0)
//!     .rate(0.05)
//!     .flat_vol(0.20)
//!     .build()
//!     .unwrap();
//! let put = VanillaOption::european_put(100.0, 1.0);
//! let px = ExplicitFdEngine::new(2_000, 120).price(&put, &market).unwrap();
//! assert!(px.price > 5.4 && px.price < 5.7);
//! ```

pub mod core;
pub mod engines;
pub mod fd;
pub mod instruments;
pub mod market;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::core::*;
    pub use crate::fd::*;
    pub use crate::instruments::*;
    pub use crate::market::*;
}
