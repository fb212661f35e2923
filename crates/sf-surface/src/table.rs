//! Rectangular performance lookup tables.

use crate::error::{SurfaceError, SurfaceResult};
use sf_core::numeric::ensure_finite;
use std::io::Read;
use std::path::Path;

/// Tabulated power over a (mass flow, pressure) grid.
///
/// Row index is mass flow (kg/s), column index is pressure (Pa), cells are
/// electrical power (W) in charging-sign convention. Axes are normalized to
/// strictly ascending order on construction; a descending source axis is
/// reversed together with the corresponding rows or columns.
#[derive(Clone, Debug)]
pub struct PerformanceTable {
    mass_flow: Vec<f64>,
    pressure: Vec<f64>,
    power: Vec<Vec<f64>>,
}

impl PerformanceTable {
    /// Build a table from raw axes and a row-major value grid.
    pub fn from_parts(
        mass_flow: Vec<f64>,
        pressure: Vec<f64>,
        power: Vec<Vec<f64>>,
    ) -> SurfaceResult<Self> {
        let mut table = Self {
            mass_flow,
            pressure,
            power,
        };
        table.normalize();
        table.validate()?;
        Ok(table)
    }

    /// Read a table from a delimited lookup file.
    ///
    /// Layout: the first header cell is a free-form label, the remaining
    /// header cells are pressure breakpoints; every following record is a
    /// mass-flow breakpoint followed by one power cell per pressure.
    pub fn from_csv_path(path: &Path) -> SurfaceResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Read a table from any CSV byte stream (see [`Self::from_csv_path`]).
    pub fn from_csv_reader<R: Read>(reader: R) -> SurfaceResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut mass_flow = Vec::new();
        let mut pressure = Vec::new();
        let mut power = Vec::new();

        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            if row == 0 {
                // Header: skip the index label, parse pressure breakpoints
                for (col, field) in record.iter().enumerate().skip(1) {
                    pressure.push(parse_cell(field, row, col)?);
                }
                continue;
            }

            let mut fields = record.iter().enumerate();
            let (col, field) = fields.next().ok_or_else(|| SurfaceError::Shape {
                what: format!("empty record at row {row}"),
            })?;
            mass_flow.push(parse_cell(field, row, col)?);

            let mut cells = Vec::with_capacity(pressure.len());
            for (col, field) in fields {
                cells.push(parse_cell(field, row, col)?);
            }
            power.push(cells);
        }

        Self::from_parts(mass_flow, pressure, power)
    }

    pub fn mass_flow(&self) -> &[f64] {
        &self.mass_flow
    }

    pub fn pressure(&self) -> &[f64] {
        &self.pressure
    }

    pub fn power(&self) -> &[Vec<f64>] {
        &self.power
    }

    /// Reverse descending axes (and the grid along with them) so both axes
    /// ascend, the precondition for fitting.
    fn normalize(&mut self) {
        if self.mass_flow.len() > 1 && self.mass_flow[0] > self.mass_flow[self.mass_flow.len() - 1]
        {
            self.mass_flow.reverse();
            self.power.reverse();
        }
        if self.pressure.len() > 1 && self.pressure[0] > self.pressure[self.pressure.len() - 1] {
            self.pressure.reverse();
            for row in &mut self.power {
                row.reverse();
            }
        }
    }

    fn validate(&self) -> SurfaceResult<()> {
        if self.mass_flow.len() < 2 {
            return Err(SurfaceError::Axis {
                what: "mass-flow axis needs at least 2 breakpoints",
            });
        }
        if self.pressure.len() < 2 {
            return Err(SurfaceError::Axis {
                what: "pressure axis needs at least 2 breakpoints",
            });
        }
        if !strictly_increasing(&self.mass_flow) {
            return Err(SurfaceError::Axis {
                what: "mass-flow axis must be strictly monotonic",
            });
        }
        if !strictly_increasing(&self.pressure) {
            return Err(SurfaceError::Axis {
                what: "pressure axis must be strictly monotonic",
            });
        }
        if self.power.len() != self.mass_flow.len() {
            return Err(SurfaceError::Shape {
                what: format!(
                    "expected {} rows, found {}",
                    self.mass_flow.len(),
                    self.power.len()
                ),
            });
        }
        for (i, row) in self.power.iter().enumerate() {
            if row.len() != self.pressure.len() {
                return Err(SurfaceError::Shape {
                    what: format!(
                        "row {} has {} cells, expected {}",
                        i,
                        row.len(),
                        self.pressure.len()
                    ),
                });
            }
            for &cell in row {
                ensure_finite(cell, "table cell")?;
            }
        }
        for &v in &self.mass_flow {
            ensure_finite(v, "mass-flow breakpoint")?;
        }
        for &v in &self.pressure {
            ensure_finite(v, "pressure breakpoint")?;
        }
        Ok(())
    }
}

fn parse_cell(field: &str, row: usize, col: usize) -> SurfaceResult<f64> {
    field.parse::<f64>().map_err(|_| SurfaceError::Parse {
        row,
        col,
        value: field.to_string(),
    })
}

fn strictly_increasing(axis: &[f64]) -> bool {
    axis.windows(2).all(|w| w[0] < w[1])
}
