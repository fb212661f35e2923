//! Spline strategy: evaluation against precomputed performance surfaces.
//!
//! Surfaces are fit in charging-sign convention (power consumed is negative).
//! Discharging flips the sign on the way in and on the way out, so the
//! forward check in `power_from_mass_flow` round-trips in both modes.

use crate::mode::{OperatingMode, PerMode};
use sf_core::numeric::relative_error;
use sf_solve::{NewtonConfig, SolveError};
use sf_surface::PerformanceSurface;

/// Relative tolerance of the forward-check round trip.
const ROUND_TRIP_RTOL: f64 = 1e-5;

/// Why a spline evaluation produced no usable value.
pub(crate) enum SplineFailure {
    Solve(SolveError),
    /// Direct evaluation landed on a branch the inverse does not recover:
    /// the re-inverted mass flow disagrees with the input.
    ForwardCheck { recovered: f64 },
}

impl From<SolveError> for SplineFailure {
    fn from(err: SolveError) -> Self {
        SplineFailure::Solve(err)
    }
}

impl std::fmt::Display for SplineFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplineFailure::Solve(err) => err.fmt(f),
            SplineFailure::ForwardCheck { recovered } => {
                write!(f, "forward check failed: re-inverted mass flow {recovered}")
            }
        }
    }
}

pub(crate) struct SplineStrategy {
    surfaces: PerMode<PerformanceSurface>,
    newton: NewtonConfig,
}

impl SplineStrategy {
    pub(crate) fn new(surfaces: PerMode<PerformanceSurface>) -> Self {
        Self {
            surfaces,
            newton: NewtonConfig::default(),
        }
    }

    /// Sign mapping between the caller's power convention and the surfaces'
    /// charging-sign convention.
    fn sign(mode: OperatingMode) -> f64 {
        match mode {
            OperatingMode::Charging => 1.0,
            OperatingMode::Discharging => -1.0,
        }
    }

    /// Invert the mode's surface: mass flow at which it reaches `power_w`.
    pub(crate) fn mass_flow_from_power(
        &self,
        power_w: f64,
        pressure_pa: f64,
        mode: OperatingMode,
    ) -> Result<f64, SplineFailure> {
        let target = Self::sign(mode) * power_w;
        let mass_flow = self
            .surfaces
            .for_mode(mode)
            .mass_flow_for_power(target, pressure_pa, &self.newton)?;
        Ok(mass_flow)
    }

    /// Direct evaluation plus forward check: the candidate power is accepted
    /// only if re-inverting it recovers the input mass flow.
    pub(crate) fn power_from_mass_flow(
        &self,
        mass_flow_kg_per_s: f64,
        pressure_pa: f64,
        mode: OperatingMode,
    ) -> Result<f64, SplineFailure> {
        let surface = self.surfaces.for_mode(mode);
        let power_w = Self::sign(mode) * surface.power(mass_flow_kg_per_s, pressure_pa);

        let recovered = self.mass_flow_from_power(power_w, pressure_pa, mode)?;
        if relative_error(recovered, mass_flow_kg_per_s) < ROUND_TRIP_RTOL {
            Ok(power_w)
        } else {
            Err(SplineFailure::ForwardCheck { recovered })
        }
    }
}
