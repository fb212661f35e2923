//! Error types for performance-table loading and surface fitting.

use sf_core::SfError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Table shape error: {what}")]
    Shape { what: String },

    #[error("Axis error: {what}")]
    Axis { what: &'static str },

    #[error("Could not parse cell (row {row}, column {col}): {value:?}")]
    Parse {
        row: usize,
        col: usize,
        value: String,
    },

    #[error("Numeric error: {what}")]
    Numeric { what: &'static str },

    #[error("Core error: {0}")]
    Core(#[from] SfError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SurfaceResult<T> = Result<T, SurfaceError>;
