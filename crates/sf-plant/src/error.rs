//! Error types for plant construction.
//!
//! Everything here is fatal at construction time. Per-call operating
//! conditions (pressure out of range, mass flow below threshold, transient
//! non-convergence) are *not* errors — they are reported as a
//! [`crate::Status`] on the returned [`crate::Evaluation`] so a long coupled
//! simulation never aborts on a single bad (power, pressure) pair.

use crate::mode::{EvaluationMethod, InvalidMode, OperatingMode};
use crate::network::NetworkError;
use sf_surface::SurfaceError;
use thiserror::Error;

pub type PlantResult<T> = Result<T, PlantError>;

#[derive(Error, Debug)]
pub enum PlantError {
    #[error("Configuration error: {what}")]
    Config { what: String },

    #[error("Evaluation method mismatch: configured {configured}, constructed for {requested}")]
    Method {
        configured: EvaluationMethod,
        requested: EvaluationMethod,
    },

    #[error("Design-point calibration failed for {mode}: {source}")]
    Calibration {
        mode: OperatingMode,
        source: NetworkError,
    },

    #[error(transparent)]
    Mode(#[from] InvalidMode),

    #[error("Performance surface error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
