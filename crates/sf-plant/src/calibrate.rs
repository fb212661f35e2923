//! Design-point calibration.
//!
//! Runs once per mode at construction, strictly before any off-design
//! evaluation: the bus power is fixed to the mode's nominal power, the
//! storage connection pressure to the nominal pressure with mass flow left
//! free, and the borehole pipe length to the minimum well depth. The
//! converged state is saved as the mode's reference state; the converged mass
//! flow becomes the plant's design mass flow. Failure here is fatal — there
//! is no valid reference state to seed later solves with.

use crate::config::PlantConfig;
use crate::error::{PlantError, PlantResult};
use crate::mode::OperatingMode;
use crate::network::{NetworkError, NetworkModel, RESIDUAL_LIMIT, ReferenceState, SolveRequest, Target};
use tracing::info;

/// Calibrated nominal operating condition for one mode.
#[derive(Clone, Debug)]
pub struct DesignPoint {
    /// Nominal electrical power (W)
    pub nominal_power_w: f64,
    /// Nominal bottom-borehole pressure (Pa)
    pub nominal_pressure_pa: f64,
    /// Mass flow at the design condition (kg/s)
    pub mass_flow_kg_per_s: f64,
    pub(crate) reference: ReferenceState,
}

pub(crate) fn calibrate(
    network: &mut dyn NetworkModel,
    mode: OperatingMode,
    config: &PlantConfig,
) -> PlantResult<DesignPoint> {
    let (bus, connection, nominal_power_w) = match mode {
        OperatingMode::Charging => (
            &config.power_bus_charge,
            &config.storage_connection_charge,
            config.power_nominal_charge_w,
        ),
        OperatingMode::Discharging => (
            &config.power_bus_discharge,
            &config.storage_connection_discharge,
            config.power_nominal_discharge_w,
        ),
    };

    let request = SolveRequest {
        bus: bus.clone(),
        bus_power: Target::Fixed(nominal_power_w),
        connection: connection.clone(),
        pressure: Target::Fixed(config.p_nom_pa),
        mass_flow: Target::Free,
        pipe: Some(config.well_pipe.clone()),
        pipe_length_m: Some(config.min_well_depth_m),
    };

    let solved = network
        .solve_design(&request)
        .map_err(|source| PlantError::Calibration { mode, source })?;

    if solved.residual > RESIDUAL_LIMIT {
        return Err(PlantError::Calibration {
            mode,
            source: NetworkError::ConvergenceFailed {
                what: format!("design residual {:e} above limit", solved.residual),
            },
        });
    }

    info!(
        mode = %mode,
        mass_flow = solved.mass_flow,
        power = nominal_power_w,
        pressure = config.p_nom_pa,
        "calibrated nominal mass flow at nominal power and pressure"
    );

    Ok(DesignPoint {
        nominal_power_w,
        nominal_pressure_pa: config.p_nom_pa,
        mass_flow_kg_per_s: solved.mass_flow,
        reference: solved.reference,
    })
}
