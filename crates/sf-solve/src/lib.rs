//! sf-solve: bounded scalar root finding for performance-map inversion.

pub mod error;
pub mod newton;

pub use error::{SolveError, SolveResult};
pub use newton::{NewtonConfig, NewtonResult, newton_bounded};
