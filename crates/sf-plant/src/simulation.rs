//! Simulation strategy: off-design solves against the external network,
//! seeded by the mode's calibrated reference state.

use crate::calibrate::{DesignPoint, calibrate};
use crate::config::PlantConfig;
use crate::error::PlantResult;
use crate::mode::OperatingMode;
use crate::network::{NetworkError, NetworkModel, RESIDUAL_LIMIT, SolveRequest, Target};
use tracing::debug;

/// Fraction of nominal power below which a request is too small to warrant
/// a solve.
const IDLE_POWER_FRACTION: f64 = 0.01;

/// Raw strategy output before the facade applies its mass-flow policy.
pub(crate) enum RawMassFlow {
    /// Requested power is negligible; no solve was run.
    Idle,
    Solved(f64),
}

/// One mode's network plus its calibrated design point.
pub(crate) struct SimulationUnit {
    bus: String,
    connection: String,
    design: DesignPoint,
    network: Box<dyn NetworkModel>,
}

impl SimulationUnit {
    /// Calibrate the design point and wrap the network for off-design use.
    pub(crate) fn commission(
        mut network: Box<dyn NetworkModel>,
        mode: OperatingMode,
        config: &PlantConfig,
    ) -> PlantResult<Self> {
        let design = calibrate(network.as_mut(), mode, config)?;
        let (bus, connection) = match mode {
            OperatingMode::Charging => (
                config.power_bus_charge.clone(),
                config.storage_connection_charge.clone(),
            ),
            OperatingMode::Discharging => (
                config.power_bus_discharge.clone(),
                config.storage_connection_discharge.clone(),
            ),
        };
        Ok(Self {
            bus,
            connection,
            design,
            network,
        })
    }

    pub(crate) fn design(&self) -> &DesignPoint {
        &self.design
    }

    /// (power, pressure) → mass flow. Bus power and interface pressure are
    /// fixed, the interface mass flow is left free.
    pub(crate) fn mass_flow_from_power(
        &mut self,
        power_w: f64,
        pressure_pa: f64,
    ) -> Result<RawMassFlow, NetworkError> {
        if power_w.abs() < self.design.nominal_power_w.abs() * IDLE_POWER_FRACTION {
            debug!(power = power_w, "requested power below idle threshold, skipping solve");
            return Ok(RawMassFlow::Idle);
        }

        let request = SolveRequest {
            bus: self.bus.clone(),
            bus_power: Target::Fixed(power_w),
            connection: self.connection.clone(),
            pressure: Target::Fixed(pressure_pa),
            mass_flow: Target::Free,
            pipe: None,
            pipe_length_m: None,
        };

        let solved = self.network.solve_offdesign(&request, &self.design.reference)?;
        check_residual(solved.residual)?;
        Ok(RawMassFlow::Solved(solved.mass_flow))
    }

    /// (mass flow, pressure) → power. The interface is fully constrained and
    /// the bus power is left free.
    pub(crate) fn power_from_mass_flow(
        &mut self,
        mass_flow_kg_per_s: f64,
        pressure_pa: f64,
    ) -> Result<f64, NetworkError> {
        let request = SolveRequest {
            bus: self.bus.clone(),
            bus_power: Target::Free,
            connection: self.connection.clone(),
            pressure: Target::Fixed(pressure_pa),
            mass_flow: Target::Fixed(mass_flow_kg_per_s),
            pipe: None,
            pipe_length_m: None,
        };

        let solved = self.network.solve_offdesign(&request, &self.design.reference)?;
        check_residual(solved.residual)?;
        Ok(solved.bus_power)
    }
}

fn check_residual(residual: f64) -> Result<(), NetworkError> {
    if residual > RESIDUAL_LIMIT {
        return Err(NetworkError::ConvergenceFailed {
            what: format!("residual {residual:e} above limit {RESIDUAL_LIMIT:e}"),
        });
    }
    Ok(())
}
