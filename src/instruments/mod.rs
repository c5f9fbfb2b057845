//! Contracts priced by the finite-difference engines.

pub mod vanilla;

pub use vanilla::VanillaOption;
