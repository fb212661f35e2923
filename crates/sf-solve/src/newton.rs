//! Bounded Newton iteration over a scalar function.

use crate::error::{SolveError, SolveResult};
use sf_core::numeric::ensure_finite;

/// Newton solver configuration.
///
/// The defaults match the operating envelope of a compressor/turbine train:
/// mass flows live in `[0, 3000]` kg/s and the search starts at 200 kg/s.
#[derive(Clone, Copy, Debug)]
pub struct NewtonConfig {
    /// Starting value for the iteration
    pub initial: f64,
    /// Lower bound, applied after every update
    pub val_min: f64,
    /// Upper bound, applied after every update
    pub val_max: f64,
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance on the residual `target - f(x)`
    pub tolerance: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            initial: 200.0,
            val_min: 0.0,
            val_max: 3000.0,
            max_iterations: 10,
            tolerance: 1e-5,
        }
    }
}

impl NewtonConfig {
    fn validate(&self) -> SolveResult<()> {
        if self.val_min > self.val_max {
            return Err(SolveError::InvalidConfig {
                what: "val_min must not exceed val_max",
            });
        }
        if !(self.tolerance > 0.0) {
            return Err(SolveError::InvalidConfig {
                what: "tolerance must be positive",
            });
        }
        if self.max_iterations == 0 {
            return Err(SolveError::InvalidConfig {
                what: "max_iterations must be at least 1",
            });
        }
        Ok(())
    }
}

/// Newton iteration result.
#[derive(Clone, Copy, Debug)]
pub struct NewtonResult {
    /// Converged value
    pub value: f64,
    /// Final residual `target - f(value)`
    pub residual: f64,
    /// Number of updates performed
    pub iterations: usize,
}

/// Find `x` in `[val_min, val_max]` such that `f(x) ≈ target`.
///
/// Classic Newton update `x ← x + (target - f(x)) / f'(x)`, with `x` clamped
/// into the bounds after every step. A converged zero is a valid solution and
/// is returned as `Ok`; running out of iterations is reported as
/// [`SolveError::NoConvergence`] so callers can tell the two apart.
pub fn newton_bounded<F, D>(f: F, df: D, target: f64, config: &NewtonConfig) -> SolveResult<NewtonResult>
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    config.validate()?;

    let mut x = config.initial.clamp(config.val_min, config.val_max);
    let mut residual = target - ensure_finite(f(x), "function value").map_err(|_| {
        SolveError::Numeric {
            what: "non-finite function value",
        }
    })?;

    for iter in 0..config.max_iterations {
        if residual.abs() < config.tolerance {
            return Ok(NewtonResult {
                value: x,
                residual,
                iterations: iter,
            });
        }

        let slope = df(x);
        if !slope.is_finite() {
            return Err(SolveError::Numeric {
                what: "non-finite derivative",
            });
        }
        if slope.abs() < 1e-12 {
            return Err(SolveError::ZeroDerivative { at: x });
        }

        x = (x + residual / slope).clamp(config.val_min, config.val_max);
        let fx = f(x);
        if !fx.is_finite() {
            return Err(SolveError::Numeric {
                what: "non-finite function value",
            });
        }
        residual = target - fx;
    }

    if residual.abs() < config.tolerance {
        return Ok(NewtonResult {
            value: x,
            residual,
            iterations: config.max_iterations,
        });
    }

    Err(SolveError::NoConvergence {
        iterations: config.max_iterations,
        residual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn simple_quadratic() {
        // Solve x^2 = 4 on [0, 3000]
        let config = NewtonConfig {
            initial: 3.0,
            ..NewtonConfig::default()
        };
        let result = newton_bounded(|x| x * x, |x| 2.0 * x, 4.0, &config).unwrap();
        assert_relative_eq!(result.value, 2.0, max_relative = 1e-6);
    }

    #[test]
    fn linear_converges_in_one_update() {
        let result =
            newton_bounded(|x| -200.0 * x, |_| -200.0, -1000.0, &NewtonConfig::default()).unwrap();
        assert_relative_eq!(result.value, 5.0, max_relative = 1e-9);
        assert!(result.iterations <= 2);
    }

    #[test]
    fn converged_zero_is_a_valid_solution() {
        // f(x) = x, target 0: the root sits exactly at the lower bound
        let result = newton_bounded(|x| x, |_| 1.0, 0.0, &NewtonConfig::default()).unwrap();
        assert_eq!(result.value, 0.0);
    }

    #[test]
    fn iteration_cap_reports_no_convergence() {
        // Derivative far too shallow for the step to reach the root in 10 updates
        let config = NewtonConfig {
            initial: 0.0,
            ..NewtonConfig::default()
        };
        let err = newton_bounded(|x| x, |_| 1000.0, 2000.0, &config).unwrap_err();
        match err {
            SolveError::NoConvergence { iterations, .. } => assert_eq!(iterations, 10),
            other => panic!("expected NoConvergence, got {other}"),
        }
    }

    #[test]
    fn updates_stay_inside_bounds() {
        // Root of x - 5000 lies above val_max; every iterate must clamp to 3000
        let err =
            newton_bounded(|x| x, |_| 1.0, 5000.0, &NewtonConfig::default()).unwrap_err();
        match err {
            SolveError::NoConvergence { residual, .. } => {
                assert_relative_eq!(residual, 2000.0, max_relative = 1e-9);
            }
            other => panic!("expected NoConvergence, got {other}"),
        }
    }

    #[test]
    fn zero_derivative_is_reported() {
        let err = newton_bounded(|_| 1.0, |_| 0.0, 2.0, &NewtonConfig::default()).unwrap_err();
        assert!(matches!(err, SolveError::ZeroDerivative { .. }));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = NewtonConfig {
            val_min: 10.0,
            val_max: 0.0,
            ..NewtonConfig::default()
        };
        let err = newton_bounded(|x| x, |_| 1.0, 1.0, &config).unwrap_err();
        assert!(matches!(err, SolveError::InvalidConfig { .. }));
    }
}
