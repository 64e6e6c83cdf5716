//! The assembled yield table and its date-grid helpers.
//!
//! A `YieldTable` is one row per observation date and one column per maturity.
//! Rows keep their values positionally aligned with `columns`, so every row has
//! the same column set and a missing value is an explicit `None`.

use chrono::{Datelike, Days, Months, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::{Maturity, Provenance};
use crate::error::PipelineError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Sampling frequency of a table's date index.
///
/// Periods are labelled by their first day: Monday for weekly, the 1st of the
/// month for monthly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl Frequency {
    /// Start of the period containing `date`.
    pub fn period_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Daily => date,
            Frequency::Weekly => {
                let back = u64::from(date.weekday().num_days_from_monday());
                date.checked_sub_days(Days::new(back)).unwrap_or(date)
            }
            Frequency::Monthly => date.with_day(1).unwrap_or(date),
        }
    }

    /// Start of the period after the one starting at `period`.
    pub fn next_period(self, period: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Daily => period.checked_add_days(Days::new(1)),
            Frequency::Weekly => period.checked_add_days(Days::new(7)),
            Frequency::Monthly => period.checked_add_months(Months::new(1)),
        }
    }

    /// Every period-start date `d` with `start <= d <= end`.
    ///
    /// Returns an empty grid when `start > end`.
    pub fn grid(self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut out = Vec::new();
        if start > end {
            return out;
        }
        let mut cur = self.period_start(start);
        if cur < start {
            match self.next_period(cur) {
                Some(next) => cur = next,
                None => return out,
            }
        }
        while cur <= end {
            out.push(cur);
            match self.next_period(cur) {
                Some(next) => cur = next,
                None => break,
            }
        }
        out
    }
}

/// Requested date window of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `end < start`.
    pub fn validated(start: NaiveDate, end: NaiveDate) -> Result<Self, PipelineError> {
        if end < start {
            return Err(PipelineError::InvalidRange(format!(
                "end date {end} is before start date {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse `YYYY-MM-DD` bounds and validate their order.
    pub fn parse(start: &str, end: &str) -> Result<Self, PipelineError> {
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        Self::validated(start, end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, PipelineError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|e| PipelineError::InvalidRange(format!("invalid date '{trimmed}': {e}")))
}

/// One observation date and one optional yield (percent) per table column.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRow {
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

impl ObservationRow {
    pub fn is_all_absent(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct YieldTable {
    pub columns: Vec<Maturity>,
    pub rows: Vec<ObservationRow>,
    pub is_synthetic: bool,
    pub requested_range: DateRange,
    pub frequency: Frequency,
}

impl YieldTable {
    pub fn empty(
        columns: Vec<Maturity>,
        requested_range: DateRange,
        frequency: Frequency,
        is_synthetic: bool,
    ) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            is_synthetic,
            requested_range,
            frequency,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn provenance(&self) -> Provenance {
        Provenance::from_synthetic(self.is_synthetic)
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    pub fn column_index(&self, maturity: Maturity) -> Option<usize> {
        self.columns.iter().position(|&m| m == maturity)
    }

    pub fn value(&self, row: usize, maturity: Maturity) -> Option<f64> {
        let col = self.column_index(maturity)?;
        self.rows.get(row).and_then(|r| r.values.get(col).copied().flatten())
    }

    /// All values of one column, in row order.
    pub fn column(&self, maturity: Maturity) -> Vec<Option<f64>> {
        match self.column_index(maturity) {
            Some(col) => self.rows.iter().map(|r| r.values[col]).collect(),
            None => vec![None; self.rows.len()],
        }
    }

    /// Min and max over every present value.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for v in self.rows.iter().flat_map(|r| r.values.iter().flatten()) {
            lo = lo.min(*v);
            hi = hi.max(*v);
        }
        if lo.is_finite() && hi.is_finite() {
            Some((lo, hi))
        } else {
            None
        }
    }

    /// A new table restricted to rows with `start <= date <= end`.
    ///
    /// The shared table is never modified; the result is re-sorted and carries
    /// the sub-range as its requested range.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> YieldTable {
        let mut out = YieldTable {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| start <= r.date && r.date <= end)
                .cloned()
                .collect(),
            is_synthetic: self.is_synthetic,
            requested_range: DateRange { start, end },
            frequency: self.frequency,
        };
        out.sort_by_date();
        out
    }

    /// Sort rows ascending by date and drop duplicate dates (first one wins).
    pub fn sort_by_date(&mut self) {
        self.rows.sort_by_key(|r| r.date);
        self.rows.dedup_by_key(|r| r.date);
    }

    pub fn drop_empty_rows(&mut self) {
        self.rows.retain(|r| !r.is_all_absent());
    }

    /// Column-wise forward fill: a gap takes the most recent earlier value.
    pub fn forward_fill(&mut self) {
        let mut last: Vec<Option<f64>> = vec![None; self.columns.len()];
        for row in &mut self.rows {
            for (slot, carried) in row.values.iter_mut().zip(last.iter_mut()) {
                if slot.is_some() {
                    *carried = *slot;
                } else {
                    *slot = *carried;
                }
            }
        }
    }
}
