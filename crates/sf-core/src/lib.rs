//! sf-core: stable foundation for storflow.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{SfError, SfResult};
pub use numeric::*;
pub use units::*;
