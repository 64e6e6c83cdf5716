//! Heatmap matrix: maturities down, dates across.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Maturity, ObservationRow, Provenance, YieldTable};
use crate::present::{MONTH_LABEL_FORMAT, sample_rows};

/// Default cap on date columns.
pub const MAX_HEATMAP_DATES: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapMatrix {
    pub provenance: Provenance,
    pub maturities: Vec<Maturity>,
    /// Sampled table dates, ascending.
    pub dates: Vec<NaiveDate>,
    /// One per entry of `dates`.
    pub x_labels: Vec<String>,
    /// Display label per maturity.
    pub y_labels: Vec<String>,
    /// Transposed values: `values[col][date]`.
    pub values: Vec<Vec<Option<f64>>>,
    pub value_range: Option<(f64, f64)>,
}

impl HeatmapMatrix {
    /// Position of `v` within the value range, in `[0, 1]`.
    pub fn normalized(&self, v: f64) -> f64 {
        match self.value_range {
            Some((lo, hi)) if hi > lo => ((v - lo) / (hi - lo)).clamp(0.0, 1.0),
            _ => 0.5,
        }
    }

    /// Column of the latest sampled date at or before `date`.
    pub fn date_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.partition_point(|d| *d <= date).checked_sub(1)
    }
}

/// Matrix of at most `MAX_HEATMAP_DATES` dates.
pub fn matrix(table: &YieldTable) -> HeatmapMatrix {
    matrix_with_limit(table, MAX_HEATMAP_DATES)
}

/// Matrix of at most `max_dates` dates (`0` for every row).
pub fn matrix_with_limit(table: &YieldTable, max_dates: usize) -> HeatmapMatrix {
    let rows: Vec<&ObservationRow> = sample_rows(table.rows.len(), max_dates)
        .into_iter()
        .map(|i| &table.rows[i])
        .collect();
    let values: Vec<Vec<Option<f64>>> = (0..table.columns.len())
        .map(|col| rows.iter().map(|r| r.values[col]).collect())
        .collect();

    HeatmapMatrix {
        provenance: table.provenance(),
        maturities: table.columns.clone(),
        dates: rows.iter().map(|r| r.date).collect(),
        x_labels: rows
            .iter()
            .map(|r| r.date.format(MONTH_LABEL_FORMAT).to_string())
            .collect(),
        y_labels: table
            .columns
            .iter()
            .map(|m| m.display_name().to_string())
            .collect(),
        values,
        value_range: table.value_range(),
    }
}
