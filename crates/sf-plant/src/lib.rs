//! sf-plant: bidirectional performance model of a compression/expansion plant
//! coupled to an underground gas storage.
//!
//! The [`PowerPlant`] facade answers two questions for an outer coupling
//! loop: given a scheduled electrical power and a bottom-borehole pressure,
//! what mass flow actually moves into or out of storage
//! ([`PowerPlant::get_mass_flow`]); and inversely, what power results from a
//! given mass flow at a given pressure ([`PowerPlant::get_power`]). Both run
//! either against an external thermodynamic network solver (off-design solves
//! seeded by a calibrated design point) or against a precomputed performance
//! surface inverted numerically — one contract, two strategies.

pub mod calibrate;
pub mod config;
pub mod error;
pub mod limits;
pub mod mode;
pub mod network;
pub mod plant;
pub mod result;

mod simulation;
mod spline;

pub use calibrate::DesignPoint;
pub use config::PlantConfig;
pub use error::{PlantError, PlantResult};
pub use limits::OperatingLimits;
pub use mode::{EvaluationMethod, InvalidMode, OperatingMode, PerMode};
pub use network::{Converged, NetworkError, NetworkModel, ReferenceState, SolveRequest, Target};
pub use plant::PowerPlant;
pub use result::{Evaluation, Status};
