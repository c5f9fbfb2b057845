//! Finite-difference time-stepping framework.
//!
//! The pieces compose bottom-up:
//! - [`LinearOperator`]: a discretized spatial operator with the algebra needed to form
//!   `I - dt * L` (implemented by [`TridiagonalOperator`]; stencils in [`operators`]).
//! - [`Scheme`]: one time step; [`ExplicitEuler`] is the forward-Euler scheme.
//! - [`FiniteDifferenceModel`]: walks a [`TimeGrid`] and applies [`StepCondition`]s.
//!
//! ```rust
//! use ferric_fd::fd::{
//!     ExplicitEuler, FiniteDifferenceModel, StepConditionSet, grid::uniform_grid,
//!     operators::heat_operator,
//! };
//!
//! let x = uniform_grid(20, 0.0, 1.0).unwrap();
//! let op = heat_operator(&x, 0.1).unwrap();
//! let mut model = FiniteDifferenceModel::new(ExplicitEuler::new(op).unwrap());
//!
//! let mut u: Vec<f64> = x.iter().map(|&xi| (std::f64::consts::PI * xi).sin()).collect();
//! model
//!     .rollback_uniform(&mut u, 0.0, 0.1, 100, &[], &mut StepConditionSet::new())
//!     .unwrap();
//! assert!(u[10] < 1.0 && u[10] > 0.8);
//! ```

pub mod condition;
pub mod explicit_euler;
pub mod grid;
pub mod model;
pub mod operator;
pub mod operators;
pub mod scheme;
pub mod stability;
pub mod time_grid;
pub mod tridiagonal;

pub use condition::{
    ConditionTiming, DirichletBoundary, ExerciseProjection, StepCondition, StepConditionSet,
};
pub use explicit_euler::ExplicitEuler;
pub use model::{FiniteDifferenceModel, SessionState};
pub use operator::LinearOperator;
pub use scheme::Scheme;
pub use stability::{StabilityReport, check_explicit_step, min_stable_steps};
pub use time_grid::TimeGrid;
pub use tridiagonal::{TimeSetter, TridiagonalOperator};
