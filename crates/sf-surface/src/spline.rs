//! Fitted bivariate performance surface.
//!
//! Power is fit with a natural cubic spline along the mass-flow axis for each
//! pressure breakpoint; evaluation blends the two adjacent columns linearly in
//! pressure. Outside the fitted knot span the splines extend linearly with the
//! boundary slope, which keeps the Newton inverse well defined when its bounds
//! exceed the grid.

use crate::error::{SurfaceError, SurfaceResult};
use crate::table::PerformanceTable;
use nalgebra::{DMatrix, DVector};
use sf_solve::{NewtonConfig, SolveResult, newton_bounded};

/// One natural cubic spline over the shared mass-flow knots.
#[derive(Clone, Debug)]
struct CubicColumn {
    values: Vec<f64>,
    second_derivs: Vec<f64>,
}

impl CubicColumn {
    fn fit(knots: &[f64], values: Vec<f64>) -> SurfaceResult<Self> {
        let second_derivs = natural_second_derivatives(knots, &values)?;
        Ok(Self {
            values,
            second_derivs,
        })
    }

    fn eval(&self, knots: &[f64], x: f64) -> f64 {
        let n = knots.len();
        if x < knots[0] {
            return self.values[0] + self.slope_in(knots, 0, knots[0]) * (x - knots[0]);
        }
        if x > knots[n - 1] {
            return self.values[n - 1]
                + self.slope_in(knots, n - 2, knots[n - 1]) * (x - knots[n - 1]);
        }

        let i = interval(knots, x);
        let h = knots[i + 1] - knots[i];
        let a = (knots[i + 1] - x) / h;
        let b = (x - knots[i]) / h;
        a * self.values[i]
            + b * self.values[i + 1]
            + ((a * a * a - a) * self.second_derivs[i]
                + (b * b * b - b) * self.second_derivs[i + 1])
                * h
                * h
                / 6.0
    }

    fn slope(&self, knots: &[f64], x: f64) -> f64 {
        let n = knots.len();
        if x < knots[0] {
            return self.slope_in(knots, 0, knots[0]);
        }
        if x > knots[n - 1] {
            return self.slope_in(knots, n - 2, knots[n - 1]);
        }
        self.slope_in(knots, interval(knots, x), x)
    }

    fn slope_in(&self, knots: &[f64], i: usize, x: f64) -> f64 {
        let h = knots[i + 1] - knots[i];
        let a = (knots[i + 1] - x) / h;
        let b = (x - knots[i]) / h;
        (self.values[i + 1] - self.values[i]) / h
            + (-(3.0 * a * a - 1.0) * self.second_derivs[i]
                + (3.0 * b * b - 1.0) * self.second_derivs[i + 1])
                * h
                / 6.0
    }
}

/// Interpolation surface mapping (mass flow, pressure) to power.
#[derive(Clone, Debug)]
pub struct PerformanceSurface {
    mass_flow: Vec<f64>,
    pressure: Vec<f64>,
    columns: Vec<CubicColumn>,
}

impl PerformanceSurface {
    /// Fit the surface over a normalized table.
    pub fn fit(table: &PerformanceTable) -> SurfaceResult<Self> {
        let mass_flow = table.mass_flow().to_vec();
        let pressure = table.pressure().to_vec();

        let mut columns = Vec::with_capacity(pressure.len());
        for j in 0..pressure.len() {
            let values: Vec<f64> = table.power().iter().map(|row| row[j]).collect();
            columns.push(CubicColumn::fit(&mass_flow, values)?);
        }

        Ok(Self {
            mass_flow,
            pressure,
            columns,
        })
    }

    /// Mass-flow knot span of the fitted grid, `(min, max)`.
    pub fn mass_flow_span(&self) -> (f64, f64) {
        (self.mass_flow[0], self.mass_flow[self.mass_flow.len() - 1])
    }

    /// Direct bivariate evaluation, power at (mass flow, pressure).
    pub fn power(&self, mass_flow: f64, pressure: f64) -> f64 {
        let (j, t) = self.pressure_blend(pressure);
        (1.0 - t) * self.columns[j].eval(&self.mass_flow, mass_flow)
            + t * self.columns[j + 1].eval(&self.mass_flow, mass_flow)
    }

    /// First partial derivative of power along the mass-flow axis.
    pub fn d_power_d_mass_flow(&self, mass_flow: f64, pressure: f64) -> f64 {
        let (j, t) = self.pressure_blend(pressure);
        (1.0 - t) * self.columns[j].slope(&self.mass_flow, mass_flow)
            + t * self.columns[j + 1].slope(&self.mass_flow, mass_flow)
    }

    /// Invert the surface along the mass-flow axis: find the mass flow at
    /// which the surface reaches `target` power for the given pressure.
    pub fn mass_flow_for_power(
        &self,
        target: f64,
        pressure: f64,
        config: &NewtonConfig,
    ) -> SolveResult<f64> {
        let result = newton_bounded(
            |x| self.power(x, pressure),
            |x| self.d_power_d_mass_flow(x, pressure),
            target,
            config,
        )?;
        Ok(result.value)
    }

    /// Pressure interval index and blending weight; the weight runs outside
    /// `[0, 1]` beyond the grid, giving linear extrapolation in pressure.
    fn pressure_blend(&self, pressure: f64) -> (usize, f64) {
        let j = interval(&self.pressure, pressure);
        let t = (pressure - self.pressure[j]) / (self.pressure[j + 1] - self.pressure[j]);
        (j, t)
    }
}

/// Index of the knot interval containing `x`, clamped to the last interval.
fn interval(knots: &[f64], x: f64) -> usize {
    let i = knots.partition_point(|k| *k <= x);
    i.saturating_sub(1).min(knots.len() - 2)
}

/// Second derivatives of the natural cubic spline through `(x, y)`.
///
/// The interior tridiagonal system is solved densely via LU; lookup grids are
/// small enough that this never matters.
fn natural_second_derivatives(x: &[f64], y: &[f64]) -> SurfaceResult<Vec<f64>> {
    let n = x.len();
    let mut y2 = vec![0.0; n];
    if n < 3 {
        return Ok(y2);
    }

    let unknowns = n - 2;
    let mut a = DMatrix::zeros(unknowns, unknowns);
    let mut rhs = DVector::zeros(unknowns);

    for r in 0..unknowns {
        let i = r + 1;
        let h_prev = x[i] - x[i - 1];
        let h_next = x[i + 1] - x[i];

        a[(r, r)] = (h_prev + h_next) / 3.0;
        if r > 0 {
            a[(r, r - 1)] = h_prev / 6.0;
        }
        if r + 1 < unknowns {
            a[(r, r + 1)] = h_next / 6.0;
        }
        rhs[r] = (y[i + 1] - y[i]) / h_next - (y[i] - y[i - 1]) / h_prev;
    }

    let solution = a.lu().solve(&rhs).ok_or(SurfaceError::Numeric {
        what: "singular spline system",
    })?;

    for r in 0..unknowns {
        y2[r + 1] = solution[r];
    }
    Ok(y2)
}
