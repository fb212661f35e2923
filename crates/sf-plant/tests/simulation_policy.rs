//! End-to-end behavior of the simulation strategy against a mock network.
//!
//! The mock is a linear machine, power = coefficient * mass flow, which makes
//! every expected value exact and lets the tests count solver invocations.

use approx::assert_relative_eq;
use serde_json::json;
use sf_core::units::{kgps, pa, w};
use sf_plant::{
    Converged, EvaluationMethod, NetworkError, NetworkModel, OperatingMode, PlantConfig,
    PlantError, PowerPlant, ReferenceState, SolveRequest, Status, Target,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Linear network: power on the bus is `coefficient` times the interface
/// mass flow. Counts design and off-design solves.
struct LinearNetwork {
    coefficient: f64,
    residual: f64,
    /// Residual reported by off-design solves, if different from `residual`.
    offdesign_residual: Option<f64>,
    /// Off-design solves with a fixed power above this magnitude fail.
    fail_above_w: Option<f64>,
    design_calls: Arc<AtomicUsize>,
    offdesign_calls: Arc<AtomicUsize>,
}

impl LinearNetwork {
    fn new(coefficient: f64) -> Self {
        Self {
            coefficient,
            residual: 1e-8,
            offdesign_residual: None,
            fail_above_w: None,
            design_calls: Arc::new(AtomicUsize::new(0)),
            offdesign_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn solve(&self, request: &SolveRequest) -> Result<Converged, NetworkError> {
        let (mass_flow, bus_power) = match (request.bus_power, request.mass_flow) {
            (Target::Fixed(power), Target::Free) => (power / self.coefficient, power),
            (Target::Free, Target::Fixed(mass_flow)) => {
                (mass_flow, self.coefficient * mass_flow)
            }
            other => {
                return Err(NetworkError::InvalidRequest {
                    what: format!("unsupported target pair {other:?}"),
                });
            }
        };
        Ok(Converged {
            mass_flow,
            bus_power,
            residual: self.residual,
            reference: ReferenceState::new("design", json!({ "coefficient": self.coefficient })),
        })
    }
}

impl NetworkModel for LinearNetwork {
    fn solve_design(&mut self, request: &SolveRequest) -> Result<Converged, NetworkError> {
        self.design_calls.fetch_add(1, Ordering::SeqCst);
        assert!(request.pipe.is_some(), "design solve fixes the borehole pipe");
        assert!(request.pipe_length_m.is_some());
        self.solve(request)
    }

    fn solve_offdesign(
        &mut self,
        request: &SolveRequest,
        reference: &ReferenceState,
    ) -> Result<Converged, NetworkError> {
        self.offdesign_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(reference.label(), "design");
        if let (Some(limit), Target::Fixed(power)) = (self.fail_above_w, request.bus_power) {
            if power.abs() > limit {
                return Err(NetworkError::ConvergenceFailed {
                    what: "residual stalled".into(),
                });
            }
        }
        let mut solved = self.solve(request)?;
        if let Some(residual) = self.offdesign_residual {
            solved.residual = residual;
        }
        Ok(solved)
    }
}

fn config() -> PlantConfig {
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
        method: EvaluationMethod::Simulation,
        spline_charge_path: None,
        spline_discharge_path: None,
    }
}

/// Plant plus the call counters of both mock networks.
fn plant() -> (PowerPlant, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    // charging consumes power (negative), discharging generates (positive)
    let charge = LinearNetwork::new(-200.0);
    let discharge = LinearNetwork::new(160.0);
    let charge_calls = Arc::clone(&charge.offdesign_calls);
    let discharge_calls = Arc::clone(&discharge.offdesign_calls);
    let plant = PowerPlant::simulation(&config(), Box::new(charge), Box::new(discharge)).unwrap();
    (plant, charge_calls, discharge_calls)
}

#[test]
fn construction_calibrates_both_design_points() {
    let (plant, _, _) = plant();

    let charge = plant.design_point(OperatingMode::Charging).unwrap();
    assert_relative_eq!(charge.mass_flow_kg_per_s, 5.0);
    assert_relative_eq!(charge.nominal_power_w, -1000.0);
    assert_relative_eq!(charge.nominal_pressure_pa, 100.0);

    let discharge = plant.design_point(OperatingMode::Discharging).unwrap();
    assert_relative_eq!(discharge.mass_flow_kg_per_s, 5.0);
}

#[test]
fn nominal_charging_request_is_met() {
    let (mut plant, _, _) = plant();
    let eval = plant.get_mass_flow(w(-1000.0), pa(100.0), OperatingMode::Charging);
    assert_eq!(eval.status, Status::Ok);
    assert_relative_eq!(eval.mass_flow.value, 5.0);
    assert_relative_eq!(eval.power.value, -1000.0);
}

#[test]
fn nominal_discharging_request_uses_its_own_network() {
    let (mut plant, charge_calls, discharge_calls) = plant();
    let eval = plant.get_mass_flow(w(800.0), pa(100.0), OperatingMode::Discharging);
    assert_eq!(eval.status, Status::Ok);
    assert_relative_eq!(eval.mass_flow.value, 5.0);
    assert_eq!(charge_calls.load(Ordering::SeqCst), 0);
    assert_eq!(discharge_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn repeated_evaluation_is_idempotent() {
    let (mut plant, _, _) = plant();
    let first = plant.get_mass_flow(w(-600.0), pa(120.0), OperatingMode::Charging);
    let second = plant.get_mass_flow(w(-600.0), pa(120.0), OperatingMode::Charging);
    assert_eq!(first.status, second.status);
    assert_relative_eq!(first.mass_flow.value, second.mass_flow.value);
    assert_relative_eq!(first.power.value, second.power.value);
}

#[test]
fn negligible_power_idles_without_solving() {
    let (mut plant, charge_calls, _) = plant();
    // below 1 % of the 1000 W nominal
    let eval = plant.get_mass_flow(w(-5.0), pa(100.0), OperatingMode::Charging);
    assert_eq!(eval.status, Status::Ok);
    assert_relative_eq!(eval.mass_flow.value, 0.0);
    assert_relative_eq!(eval.power.value, 0.0);
    assert_eq!(charge_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn out_of_range_pressure_is_rejected_before_solving() {
    let (mut plant, charge_calls, _) = plant();

    let low = plant.get_mass_flow(w(-1000.0), pa(10.0), OperatingMode::Charging);
    assert_eq!(low.status, Status::PressureBelowMin);
    assert_relative_eq!(low.mass_flow.value, 0.0);
    assert_relative_eq!(low.power.value, 0.0);

    let high = plant.get_mass_flow(w(-1000.0), pa(500.0), OperatingMode::Charging);
    assert_eq!(high.status, Status::PressureAboveMax);

    assert_eq!(charge_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn mass_flow_below_threshold_is_rejected() {
    let (mut plant, _, _) = plant();
    // -100 W is above the idle cutoff but solves to 0.5 kg/s, below the
    // 1 kg/s minimum (0.1 * 10 kg/s ceiling)
    let eval = plant.get_mass_flow(w(-100.0), pa(100.0), OperatingMode::Charging);
    assert_eq!(eval.status, Status::MassFlowBelowThreshold);
    assert_relative_eq!(eval.mass_flow.value, 0.0);
    assert_relative_eq!(eval.power.value, 0.0);
}

#[test]
fn excess_power_is_clamped_to_the_flow_ceiling() {
    let (mut plant, charge_calls, _) = plant();
    // -4000 W solves to 20 kg/s, twice the ceiling
    let eval = plant.get_mass_flow(w(-4000.0), pa(100.0), OperatingMode::Charging);
    assert_eq!(eval.status, Status::MassFlowAboveMax);
    assert_relative_eq!(eval.mass_flow.value, 10.0);
    // power recomputed at the ceiling, not the scheduled power
    assert_relative_eq!(eval.power.value, -2000.0);
    // one inverse solve plus one direct solve at the ceiling
    assert_eq!(charge_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn get_power_returns_power_at_given_flow() {
    let (mut plant, _, _) = plant();
    let eval = plant.get_power(kgps(5.0), pa(100.0), OperatingMode::Charging);
    assert_eq!(eval.status, Status::Ok);
    assert_relative_eq!(eval.mass_flow.value, 5.0);
    assert_relative_eq!(eval.power.value, -1000.0);
}

#[test]
fn get_power_rejects_flow_below_minimum() {
    let (mut plant, charge_calls, _) = plant();
    let eval = plant.get_power(kgps(0.5), pa(100.0), OperatingMode::Charging);
    assert_eq!(eval.status, Status::MassFlowBelowThreshold);
    assert_eq!(charge_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn get_power_clamps_flow_above_ceiling() {
    let (mut plant, _, _) = plant();
    let eval = plant.get_power(kgps(20.0), pa(100.0), OperatingMode::Charging);
    assert_eq!(eval.status, Status::MassFlowAboveMax);
    assert_relative_eq!(eval.mass_flow.value, 10.0);
    assert_relative_eq!(eval.power.value, -2000.0);
}

#[test]
fn failed_solve_is_reported_and_recoverable() {
    let mut charge = LinearNetwork::new(-200.0);
    charge.fail_above_w = Some(1500.0);
    let discharge = LinearNetwork::new(160.0);
    let mut plant =
        PowerPlant::simulation(&config(), Box::new(charge), Box::new(discharge)).unwrap();

    let failed = plant.get_mass_flow(w(-1600.0), pa(100.0), OperatingMode::Charging);
    assert_eq!(failed.status, Status::NoConvergence);
    assert_relative_eq!(failed.mass_flow.value, 0.0);
    assert_relative_eq!(failed.power.value, 0.0);

    // the plant stays usable after a transient failure
    let ok = plant.get_mass_flow(w(-1000.0), pa(100.0), OperatingMode::Charging);
    assert_eq!(ok.status, Status::Ok);
    assert_relative_eq!(ok.mass_flow.value, 5.0);
}

#[test]
fn high_offdesign_residual_is_discarded() {
    let mut charge = LinearNetwork::new(-200.0);
    charge.offdesign_residual = Some(1e-1);
    let mut plant = PowerPlant::simulation(
        &config(),
        Box::new(charge),
        Box::new(LinearNetwork::new(160.0)),
    )
    .unwrap();

    let eval = plant.get_mass_flow(w(-1000.0), pa(100.0), OperatingMode::Charging);
    assert_eq!(eval.status, Status::NoConvergence);
    assert_relative_eq!(eval.mass_flow.value, 0.0);
}

#[test]
fn high_design_residual_fails_calibration() {
    let mut charge = LinearNetwork::new(-200.0);
    charge.residual = 1e-2;
    let err = PowerPlant::simulation(
        &config(),
        Box::new(charge),
        Box::new(LinearNetwork::new(160.0)),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PlantError::Calibration {
            mode: OperatingMode::Charging,
            ..
        }
    ));
}

#[test]
fn method_mismatch_fails_construction() {
    let mut config = config();
    config.method = EvaluationMethod::Spline;
    config.spline_charge_path = Some("charge.csv".into());
    config.spline_discharge_path = Some("discharge.csv".into());

    let err = PowerPlant::simulation(
        &config,
        Box::new(LinearNetwork::new(-200.0)),
        Box::new(LinearNetwork::new(160.0)),
    )
    .unwrap_err();
    assert!(matches!(err, PlantError::Method { .. }));
}
