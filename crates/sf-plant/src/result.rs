//! Evaluation results returned to the outer coupling loop.

use sf_core::units::{MassRate, Power, kgps, w};

/// Outcome classification of a single evaluation.
///
/// Everything except `Ok` means "the plant could not meet the schedule this
/// step"; the coupling loop is expected to carry on with the returned values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok,
    PressureBelowMin,
    PressureAboveMax,
    MassFlowBelowThreshold,
    /// The raw solution exceeded the mode's flow ceiling; the returned values
    /// are clamped to the ceiling with the power recomputed there.
    MassFlowAboveMax,
    NoConvergence,
}

impl Status {
    pub fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}

/// Result of `get_mass_flow` / `get_power`.
#[derive(Clone, Copy, Debug)]
pub struct Evaluation {
    /// Mass flow from/into the storage.
    pub mass_flow: MassRate,
    /// Electrical power actually achieved; differs from the scheduled power
    /// if the schedule could not be met.
    pub power: Power,
    pub status: Status,
}

impl Evaluation {
    pub(crate) fn ok(mass_flow_kg_per_s: f64, power_w: f64) -> Self {
        Self {
            mass_flow: kgps(mass_flow_kg_per_s),
            power: w(power_w),
            status: Status::Ok,
        }
    }

    /// Zero/zero pair carrying a failure status.
    pub(crate) fn rejected(status: Status) -> Self {
        Self {
            mass_flow: kgps(0.0),
            power: w(0.0),
            status,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}
