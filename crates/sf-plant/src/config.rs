//! Plant control-file schema and validation.
//!
//! The control file is JSON, one per scenario. Spline table paths are
//! resolved relative to the control file's directory on load.

use crate::error::{PlantError, PlantResult};
use crate::mode::EvaluationMethod;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlantConfig {
    /// Power bus of the compressor train
    pub power_bus_charge: String,
    /// Power bus of the turbine train
    pub power_bus_discharge: String,
    /// Nominal charging power (W, negative: power consumed)
    pub power_nominal_charge_w: f64,
    /// Nominal discharging power (W, positive: power generated)
    pub power_nominal_discharge_w: f64,
    /// Nominal bottom-borehole pressure (Pa)
    pub p_nom_pa: f64,
    /// Storage-side interface connection, charging network
    pub storage_connection_charge: String,
    /// Storage-side interface connection, discharging network
    pub storage_connection_discharge: String,
    /// Borehole pipe component connecting plant and storage
    pub well_pipe: String,
    /// Depth of the wells (m); fixes the borehole pipe length at design
    pub min_well_depth_m: f64,
    /// Number of wells sharing the flow (scales the per-pipe pressure loss)
    pub num_wells: u32,
    /// Minimum bottom-borehole pressure (Pa)
    pub p_min_pa: f64,
    /// Maximum bottom-borehole pressure (Pa)
    pub p_max_pa: f64,
    /// Charging mass-flow ceiling (kg/s)
    pub massflow_charge_max_kg_per_s: f64,
    /// Discharging mass-flow ceiling (kg/s)
    pub massflow_discharge_max_kg_per_s: f64,
    /// Minimum worthwhile mass flow as a fraction of the ceiling, in (0, 1]
    pub massflow_min_rel: f64,
    /// Evaluation strategy, fixed for the plant instance
    pub method: EvaluationMethod,
    /// Charging lookup table, required for the spline method
    #[serde(default)]
    pub spline_charge_path: Option<PathBuf>,
    /// Discharging lookup table, required for the spline method
    #[serde(default)]
    pub spline_discharge_path: Option<PathBuf>,
}

impl PlantConfig {
    /// Load and validate a control file.
    pub fn load_json(path: &Path) -> PlantResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: PlantConfig = serde_json::from_str(&content)?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.spline_charge_path, &mut self.spline_discharge_path]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&path);
            }
        }
    }

    pub fn validate(&self) -> PlantResult<()> {
        if self.p_min_pa > self.p_max_pa {
            return Err(config_error(format!(
                "p_min_pa ({}) exceeds p_max_pa ({})",
                self.p_min_pa, self.p_max_pa
            )));
        }
        if !(self.massflow_min_rel > 0.0 && self.massflow_min_rel <= 1.0) {
            return Err(config_error(format!(
                "massflow_min_rel must be in (0, 1], got {}",
                self.massflow_min_rel
            )));
        }
        if self.massflow_charge_max_kg_per_s <= 0.0 || self.massflow_discharge_max_kg_per_s <= 0.0
        {
            return Err(config_error("mass-flow ceilings must be positive".into()));
        }
        if self.min_well_depth_m <= 0.0 {
            return Err(config_error("min_well_depth_m must be positive".into()));
        }
        if self.num_wells == 0 {
            return Err(config_error("num_wells must be at least 1".into()));
        }
        if self.power_nominal_charge_w >= 0.0 {
            return Err(config_error(
                "power_nominal_charge_w must be negative (power consumed)".into(),
            ));
        }
        if self.power_nominal_discharge_w <= 0.0 {
            return Err(config_error(
                "power_nominal_discharge_w must be positive (power generated)".into(),
            ));
        }
        if self.method == EvaluationMethod::Spline
            && (self.spline_charge_path.is_none() || self.spline_discharge_path.is_none())
        {
            return Err(config_error(
                "spline method requires spline_charge_path and spline_discharge_path".into(),
            ));
        }
        Ok(())
    }
}

fn config_error(what: String) -> PlantError {
    PlantError::Config { what }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config(method: EvaluationMethod) -> PlantConfig {
        PlantConfig {
            power_bus_charge: "power input".into(),
            power_bus_discharge: "power output".into(),
            power_nominal_charge_w: -1000.0,
            power_nominal_discharge_w: 800.0,
            p_nom_pa: 100.0,
            storage_connection_charge: "compressor:out".into(),
            storage_connection_discharge: "storage:out".into(),
            well_pipe: "borehole pipe".into(),
            min_well_depth_m: 700.0,
            num_wells: 2,
            p_min_pa: 50.0,
            p_max_pa: 150.0,
            massflow_charge_max_kg_per_s: 10.0,
            massflow_discharge_max_kg_per_s: 12.0,
            massflow_min_rel: 0.1,
            method,
            spline_charge_path: None,
            spline_discharge_path: None,
        }
    }

    #[test]
    fn valid_simulation_config_passes() {
        base_config(EvaluationMethod::Simulation).validate().unwrap();
    }

    #[test]
    fn inverted_pressure_window_is_rejected() {
        let mut config = base_config(EvaluationMethod::Simulation);
        config.p_min_pa = 200.0;
        assert!(matches!(
            config.validate().unwrap_err(),
            PlantError::Config { .. }
        ));
    }

    #[test]
    fn min_rel_outside_unit_interval_is_rejected() {
        let mut config = base_config(EvaluationMethod::Simulation);
        config.massflow_min_rel = 0.0;
        assert!(config.validate().is_err());
        config.massflow_min_rel = 1.5;
        assert!(config.validate().is_err());
        config.massflow_min_rel = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn charge_power_sign_convention_is_enforced() {
        let mut config = base_config(EvaluationMethod::Simulation);
        config.power_nominal_charge_w = 1000.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn spline_method_requires_table_paths() {
        let config = base_config(EvaluationMethod::Spline);
        assert!(config.validate().is_err());

        let mut config = base_config(EvaluationMethod::Spline);
        config.spline_charge_path = Some("charge.csv".into());
        config.spline_discharge_path = Some("discharge.csv".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_json_resolves_relative_table_paths() {
        let dir = std::env::temp_dir().join("sf-plant-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let mut config = base_config(EvaluationMethod::Spline);
        config.spline_charge_path = Some("charge.csv".into());
        config.spline_discharge_path = Some("discharge.csv".into());

        let path = dir.join("scenario.powerplant_ctrl.json");
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = PlantConfig::load_json(&path).unwrap();
        assert_eq!(loaded.spline_charge_path.unwrap(), dir.join("charge.csv"));
        assert_eq!(loaded.method, EvaluationMethod::Spline);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = base_config(EvaluationMethod::Simulation);
        let text = serde_json::to_string(&config).unwrap();
        let back: PlantConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
