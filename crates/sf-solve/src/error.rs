//! Error types for scalar solve operations.

use thiserror::Error;

/// Errors that can occur while searching for a root.
#[derive(Error, Debug)]
pub enum SolveError {
    #[error(
        "Newton iteration did not converge after {iterations} iterations (residual {residual:e})"
    )]
    NoConvergence { iterations: usize, residual: f64 },

    #[error("Derivative vanished at x = {at}")]
    ZeroDerivative { at: f64 },

    #[error("Invalid solver configuration: {what}")]
    InvalidConfig { what: &'static str },

    #[error("Numeric error: {what}")]
    Numeric { what: &'static str },
}

pub type SolveResult<T> = Result<T, SolveError>;
