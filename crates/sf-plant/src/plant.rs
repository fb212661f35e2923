//! Performance model facade.
//!
//! Validates operating limits, dispatches to the configured strategy, and
//! applies the mass-flow clamp/reject policy. Evaluation methods take
//! `&mut self`: the external network's set-attributes-then-solve sequence is
//! not reentrant, so calls on one plant instance are serialized by the borrow
//! checker.

use crate::calibrate::DesignPoint;
use crate::config::PlantConfig;
use crate::error::{PlantError, PlantResult};
use crate::limits::{MASS_FLOW_TOL_KG_PER_S, OperatingLimits};
use crate::mode::{EvaluationMethod, OperatingMode, PerMode};
use crate::network::NetworkModel;
use crate::result::{Evaluation, Status};
use crate::simulation::{RawMassFlow, SimulationUnit};
use crate::spline::SplineStrategy;
use sf_core::units::{MassRate, Power, Pressure, kgps, w};
use sf_surface::{PerformanceSurface, PerformanceTable};
use tracing::{debug, error, warn};

enum Strategy {
    Simulation(PerMode<SimulationUnit>),
    Spline(SplineStrategy),
}

/// Performance model of the compressor/turbine train.
///
/// Stateless per call: the only cached artifacts are the design points and
/// fitted surfaces established at construction.
pub struct PowerPlant {
    limits: OperatingLimits,
    strategy: Strategy,
}

impl std::fmt::Debug for PowerPlant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerPlant")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl PowerPlant {
    /// Build a simulation-based plant. Calibrates both networks at their
    /// nominal conditions; a failed design solve aborts construction.
    pub fn simulation(
        config: &PlantConfig,
        charge_network: Box<dyn NetworkModel>,
        discharge_network: Box<dyn NetworkModel>,
    ) -> PlantResult<Self> {
        config.validate()?;
        expect_method(config, EvaluationMethod::Simulation)?;

        let units = PerMode {
            charge: SimulationUnit::commission(charge_network, OperatingMode::Charging, config)?,
            discharge: SimulationUnit::commission(
                discharge_network,
                OperatingMode::Discharging,
                config,
            )?,
        };

        Ok(Self {
            limits: OperatingLimits::from_config(config),
            strategy: Strategy::Simulation(units),
        })
    }

    /// Build a spline-based plant from the lookup tables named in the config.
    pub fn spline_from_files(config: &PlantConfig) -> PlantResult<Self> {
        config.validate()?;
        expect_method(config, EvaluationMethod::Spline)?;

        let charge_path = config.spline_charge_path.as_ref().ok_or_else(|| {
            PlantError::Config {
                what: "spline_charge_path is required for the spline method".into(),
            }
        })?;
        let discharge_path = config.spline_discharge_path.as_ref().ok_or_else(|| {
            PlantError::Config {
                what: "spline_discharge_path is required for the spline method".into(),
            }
        })?;

        let charge = PerformanceTable::from_csv_path(charge_path)?;
        let discharge = PerformanceTable::from_csv_path(discharge_path)?;
        Self::spline_from_tables(config, charge, discharge)
    }

    /// Build a spline-based plant from in-memory tables.
    pub fn spline_from_tables(
        config: &PlantConfig,
        charge: PerformanceTable,
        discharge: PerformanceTable,
    ) -> PlantResult<Self> {
        config.validate()?;
        expect_method(config, EvaluationMethod::Spline)?;

        let surfaces = PerMode {
            charge: PerformanceSurface::fit(&charge)?,
            discharge: PerformanceSurface::fit(&discharge)?,
        };

        Ok(Self {
            limits: OperatingLimits::from_config(config),
            strategy: Strategy::Spline(SplineStrategy::new(surfaces)),
        })
    }

    pub fn limits(&self) -> &OperatingLimits {
        &self.limits
    }

    /// Calibrated design point for the mode; `None` for spline plants.
    pub fn design_point(&self, mode: OperatingMode) -> Option<&DesignPoint> {
        match &self.strategy {
            Strategy::Simulation(units) => Some(units.for_mode(mode).design()),
            Strategy::Spline(_) => None,
        }
    }

    /// Mass flow at the given scheduled power and bottom-borehole pressure.
    ///
    /// Returns the mass flow from/into storage together with the power
    /// actually achieved; the two differ from the request whenever the
    /// schedule cannot be met (see [`Status`]).
    pub fn get_mass_flow(
        &mut self,
        power: Power,
        pressure: Pressure,
        mode: OperatingMode,
    ) -> Evaluation {
        let power_w = power.value;
        let pressure_pa = pressure.value;

        if let Some(status) = self.reject_pressure(pressure_pa) {
            return Evaluation::rejected(status);
        }

        let raw = match &mut self.strategy {
            Strategy::Simulation(units) => {
                match units.for_mode_mut(mode).mass_flow_from_power(power_w, pressure_pa) {
                    Ok(RawMassFlow::Idle) => return Evaluation::ok(0.0, 0.0),
                    Ok(RawMassFlow::Solved(mass_flow)) => mass_flow,
                    Err(err) => {
                        error!(
                            %err,
                            power = power_w,
                            pressure = pressure_pa,
                            "could not find a solution for input pair"
                        );
                        return Evaluation::rejected(Status::NoConvergence);
                    }
                }
            }
            Strategy::Spline(spline) => {
                match spline.mass_flow_from_power(power_w, pressure_pa, mode) {
                    Ok(mass_flow) => mass_flow,
                    Err(failure) => {
                        error!(
                            %failure,
                            power = power_w,
                            pressure = pressure_pa,
                            "could not find a solution for input pair"
                        );
                        return Evaluation::rejected(Status::NoConvergence);
                    }
                }
            }
        };

        self.apply_mass_flow_policy(raw, power_w, pressure, mode)
    }

    /// Power at the given mass flow and bottom-borehole pressure.
    pub fn get_power(
        &mut self,
        mass_flow: MassRate,
        pressure: Pressure,
        mode: OperatingMode,
    ) -> Evaluation {
        let mass_flow_kg_per_s = mass_flow.value;
        let pressure_pa = pressure.value;

        if let Some(status) = self.reject_pressure(pressure_pa) {
            return Evaluation::rejected(status);
        }

        let m_min = self.limits.min_mass_flow(mode);
        let m_max = self.limits.max_mass_flow(mode);

        if mass_flow_kg_per_s < m_min - MASS_FLOW_TOL_KG_PER_S {
            warn!(
                mass_flow = mass_flow_kg_per_s,
                minimum = m_min,
                "mass flow below minimum mass flow"
            );
            return Evaluation::rejected(Status::MassFlowBelowThreshold);
        }
        if mass_flow_kg_per_s > m_max + MASS_FLOW_TOL_KG_PER_S {
            warn!(
                mass_flow = mass_flow_kg_per_s,
                maximum = m_max,
                "mass flow above maximum mass flow, evaluating at the ceiling"
            );
            // One-level recursion: the ceiling itself is always in range.
            let at_ceiling = self.get_power(kgps(m_max), pressure, mode);
            return Evaluation {
                mass_flow: kgps(m_max),
                power: at_ceiling.power,
                status: Status::MassFlowAboveMax,
            };
        }

        let power_w = match &mut self.strategy {
            Strategy::Simulation(units) => {
                match units
                    .for_mode_mut(mode)
                    .power_from_mass_flow(mass_flow_kg_per_s, pressure_pa)
                {
                    Ok(power_w) => power_w,
                    Err(err) => {
                        error!(
                            %err,
                            mass_flow = mass_flow_kg_per_s,
                            pressure = pressure_pa,
                            "could not find a solution for input pair"
                        );
                        return Evaluation::rejected(Status::NoConvergence);
                    }
                }
            }
            Strategy::Spline(spline) => {
                match spline.power_from_mass_flow(mass_flow_kg_per_s, pressure_pa, mode) {
                    Ok(power_w) => power_w,
                    Err(failure) => {
                        error!(
                            %failure,
                            mass_flow = mass_flow_kg_per_s,
                            pressure = pressure_pa,
                            "rejecting spline power evaluation"
                        );
                        return Evaluation::rejected(Status::NoConvergence);
                    }
                }
            }
        };

        Evaluation {
            mass_flow,
            power: w(power_w),
            status: Status::Ok,
        }
    }

    fn reject_pressure(&self, pressure_pa: f64) -> Option<Status> {
        let status = self.limits.check_pressure(pressure_pa)?;
        error!(
            pressure = pressure_pa,
            p_min = self.limits.p_min_pa,
            p_max = self.limits.p_max_pa,
            "pressure outside operating range"
        );
        Some(status)
    }

    /// Post-hoc mass-flow policy: reject flows below the worthwhile minimum,
    /// clamp flows above the ceiling and recompute the achievable power
    /// there, pass everything else through as scheduled.
    fn apply_mass_flow_policy(
        &mut self,
        raw: f64,
        scheduled_power_w: f64,
        pressure: Pressure,
        mode: OperatingMode,
    ) -> Evaluation {
        let m_min = self.limits.min_mass_flow(mode);
        let m_max = self.limits.max_mass_flow(mode);

        if raw.abs() < m_min {
            warn!(
                mass_flow = raw,
                minimum = m_min,
                "mass flow below minimum mass flow"
            );
            return Evaluation::rejected(Status::MassFlowBelowThreshold);
        }
        if raw > m_max {
            warn!(
                mass_flow = raw,
                maximum = m_max,
                "mass flow above maximum mass flow, adjusting power to match the ceiling"
            );
            let at_ceiling = self.get_power(kgps(m_max), pressure, mode);
            return Evaluation {
                mass_flow: kgps(m_max),
                power: at_ceiling.power,
                status: Status::MassFlowAboveMax,
            };
        }

        debug!(
            mass_flow = raw,
            power = scheduled_power_w,
            "calculation successful"
        );
        Evaluation::ok(raw, scheduled_power_w)
    }
}

fn expect_method(config: &PlantConfig, requested: EvaluationMethod) -> PlantResult<()> {
    if config.method != requested {
        return Err(PlantError::Method {
            configured: config.method,
            requested,
        });
    }
    Ok(())
}
