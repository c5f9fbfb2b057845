//! Finite-difference PDE pricing engines built on [`crate::fd`].

pub mod explicit_fd;

pub use explicit_fd::ExplicitFdEngine;
