//! sf-surface: tabulated plant performance maps and their fitted surfaces.
//!
//! A [`PerformanceTable`] is a rectangular grid of power values indexed by
//! (mass flow, pressure), read from a delimited lookup file. A
//! [`PerformanceSurface`] is the interpolation surface fitted over that grid,
//! with a numeric inverse along the mass-flow axis.

pub mod error;
pub mod spline;
pub mod table;

pub use error::{SurfaceError, SurfaceResult};
pub use spline::PerformanceSurface;
pub use table::PerformanceTable;
