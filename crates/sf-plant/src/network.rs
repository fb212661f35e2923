//! Interface to the external thermodynamic network solver.
//!
//! The solver itself is an external collaborator; this module pins down the
//! contract the plant relies on. Each solve receives an immutable
//! [`SolveRequest`] naming what is fixed and what is left free, instead of
//! mutating bus/connection attributes on a shared model. The solver's own
//! per-call scratch state is still not reentrant, so callers must not
//! interleave two solves on the same network instance — the facade serializes
//! them by taking `&mut self`.

use serde_json::Value;
use thiserror::Error;

/// Convergence residual above which an off-design solution is discarded.
pub(crate) const RESIDUAL_LIMIT: f64 = 1e-3;

/// A boundary value in a solve request: fixed to a value, or left for the
/// solver to determine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Target {
    Fixed(f64),
    Free,
}

/// One solve, fully specified up front. All quantities SI.
#[derive(Clone, Debug)]
pub struct SolveRequest {
    /// Power bus to constrain or read
    pub bus: String,
    /// Electrical power target on the bus (W)
    pub bus_power: Target,
    /// Storage-side interface connection
    pub connection: String,
    /// Pressure at the interface connection (Pa)
    pub pressure: Target,
    /// Mass flow at the interface connection (kg/s)
    pub mass_flow: Target,
    /// Borehole pipe component, set during design solves only
    pub pipe: Option<String>,
    /// Borehole pipe length (m), set during design solves only
    pub pipe_length_m: Option<f64>,
}

/// Opaque converged-state artifact saved by a design solve and used to seed
/// later off-design solves. Owned by the mode's strategy; never mutated.
#[derive(Clone, Debug)]
pub struct ReferenceState {
    label: String,
    payload: Value,
}

impl ReferenceState {
    pub fn new(label: impl Into<String>, payload: Value) -> Self {
        Self {
            label: label.into(),
            payload,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

/// Converged solver output.
#[derive(Clone, Debug)]
pub struct Converged {
    /// Mass flow at the interface connection (kg/s)
    pub mass_flow: f64,
    /// Electrical power on the bus (W)
    pub bus_power: f64,
    /// Scalar convergence residual reported by the solver
    pub residual: f64,
    /// Saved converged state, usable as a seed for off-design solves
    pub reference: ReferenceState,
}

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Network solve did not converge: {what}")]
    ConvergenceFailed { what: String },

    #[error("Invalid solve request: {what}")]
    InvalidRequest { what: String },

    #[error("Solver backend error: {what}")]
    Backend { what: String },
}

/// External thermodynamic network, one instance per operating mode.
pub trait NetworkModel {
    /// Design-mode solve: calibrates the network at nominal conditions and
    /// saves the converged state.
    fn solve_design(&mut self, request: &SolveRequest) -> Result<Converged, NetworkError>;

    /// Off-design solve seeded by a previously saved reference state.
    fn solve_offdesign(
        &mut self,
        request: &SolveRequest,
        reference: &ReferenceState,
    ) -> Result<Converged, NetworkError>;
}
