//! 3D surface mesh: tenor x time x yield.

use serde::Serialize;

use crate::domain::{ObservationRow, Provenance, YieldTable};
use crate::present::sample_rows;

/// Default cap on time points in a mesh.
pub const MAX_SURFACE_ROWS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceMesh {
    pub provenance: Provenance,
    /// Tenor in years, one per column.
    pub x: Vec<f64>,
    /// Days since the first table row, one per mesh row.
    pub y: Vec<i64>,
    /// `z[row][col]`; `NaN` where the table has no value.
    pub z: Vec<Vec<f64>>,
    pub date_labels: Vec<String>,
}

impl SurfaceMesh {
    /// `(rows, cols)` of the z matrix.
    pub fn dims(&self) -> (usize, usize) {
        (self.y.len(), self.x.len())
    }
}

/// Mesh of at most `MAX_SURFACE_ROWS` time points.
pub fn mesh(table: &YieldTable) -> SurfaceMesh {
    mesh_with_limit(table, MAX_SURFACE_ROWS)
}

/// Mesh of at most `max_rows` time points (`0` for every row).
pub fn mesh_with_limit(table: &YieldTable, max_rows: usize) -> SurfaceMesh {
    let first = table.first_date();
    let rows: Vec<&ObservationRow> = sample_rows(table.rows.len(), max_rows)
        .into_iter()
        .map(|i| &table.rows[i])
        .collect();
    SurfaceMesh {
        provenance: table.provenance(),
        x: table.columns.iter().map(|m| m.tenor_years()).collect(),
        y: rows
            .iter()
            .map(|r| first.map(|f| (r.date - f).num_days()).unwrap_or(0))
            .collect(),
        z: rows
            .iter()
            .map(|r| r.values.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
            .collect(),
        date_labels: rows
            .iter()
            .map(|r| r.date.format(crate::domain::DATE_FORMAT).to_string())
            .collect(),
    }
}
