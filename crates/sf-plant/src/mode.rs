//! Operating modes and evaluation methods.
//!
//! Both are closed enumerations with exhaustive dispatch: an unknown mode or
//! method fails at parse/validation time instead of silently falling through.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("mode must be 'charging' or 'discharging', got {0:?}")]
pub struct InvalidMode(pub String);

/// Direction the plant is operating in.
///
/// Charging compresses working fluid into storage and consumes electrical
/// power (negative sign convention); discharging expands fluid from storage
/// and generates power (positive).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    Charging,
    Discharging,
}

impl OperatingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            OperatingMode::Charging => "charging",
            OperatingMode::Discharging => "discharging",
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatingMode {
    type Err = InvalidMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "charging" => Ok(OperatingMode::Charging),
            "discharging" => Ok(OperatingMode::Discharging),
            other => Err(InvalidMode(other.to_string())),
        }
    }
}

/// How the plant evaluates off-design operating points. Fixed per instance
/// at construction; never changes at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationMethod {
    /// Iterative solves against the external thermodynamic network.
    Simulation,
    /// Precomputed interpolation surface, inverted numerically.
    Spline,
}

impl fmt::Display for EvaluationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EvaluationMethod::Simulation => "simulation",
            EvaluationMethod::Spline => "spline",
        })
    }
}

/// A pair of per-mode artifacts (design points, surfaces, networks).
#[derive(Clone, Copy, Debug)]
pub struct PerMode<T> {
    pub charge: T,
    pub discharge: T,
}

impl<T> PerMode<T> {
    pub fn for_mode(&self, mode: OperatingMode) -> &T {
        match mode {
            OperatingMode::Charging => &self.charge,
            OperatingMode::Discharging => &self.discharge,
        }
    }

    pub fn for_mode_mut(&mut self, mode: OperatingMode) -> &mut T {
        match mode {
            OperatingMode::Charging => &mut self.charge,
            OperatingMode::Discharging => &mut self.discharge,
        }
    }
}
