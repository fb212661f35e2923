//! Physical operating limits of the plant.

use crate::config::PlantConfig;
use crate::mode::OperatingMode;
use crate::result::Status;

/// Slack on pressure-range comparisons (Pa).
pub(crate) const PRESSURE_TOL_PA: f64 = 1e-4;
/// Slack on mass-flow range comparisons in `get_power` (kg/s).
pub(crate) const MASS_FLOW_TOL_KG_PER_S: f64 = 1e-4;

/// Pressure and mass-flow bounds, immutable after construction.
#[derive(Clone, Copy, Debug)]
pub struct OperatingLimits {
    /// Minimum bottom-borehole pressure (Pa)
    pub p_min_pa: f64,
    /// Maximum bottom-borehole pressure (Pa)
    pub p_max_pa: f64,
    /// Minimum mass flow as a fraction of the mode's ceiling, in (0, 1]
    pub massflow_min_rel: f64,
    /// Charging flow ceiling (kg/s)
    pub massflow_charge_max: f64,
    /// Discharging flow ceiling (kg/s)
    pub massflow_discharge_max: f64,
}

impl OperatingLimits {
    pub(crate) fn from_config(config: &PlantConfig) -> Self {
        Self {
            p_min_pa: config.p_min_pa,
            p_max_pa: config.p_max_pa,
            massflow_min_rel: config.massflow_min_rel,
            massflow_charge_max: config.massflow_charge_max_kg_per_s,
            massflow_discharge_max: config.massflow_discharge_max_kg_per_s,
        }
    }

    /// Flow ceiling for the mode (kg/s).
    pub fn max_mass_flow(&self, mode: OperatingMode) -> f64 {
        match mode {
            OperatingMode::Charging => self.massflow_charge_max,
            OperatingMode::Discharging => self.massflow_discharge_max,
        }
    }

    /// Minimum worthwhile flow for the mode (kg/s).
    pub fn min_mass_flow(&self, mode: OperatingMode) -> f64 {
        self.massflow_min_rel * self.max_mass_flow(mode)
    }

    pub(crate) fn check_pressure(&self, pressure_pa: f64) -> Option<Status> {
        if pressure_pa + PRESSURE_TOL_PA < self.p_min_pa {
            Some(Status::PressureBelowMin)
        } else if pressure_pa - PRESSURE_TOL_PA > self.p_max_pa {
            Some(Status::PressureAboveMax)
        } else {
            None
        }
    }
}
