//! Reporting utilities: per-maturity statistics and curve snapshots.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Maturity, YieldTable};

pub mod format;

pub use format::*;

/// Summary of one table column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaturityStats {
    pub maturity: Maturity,
    pub series_id: &'static str,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub count: usize,
    pub current: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std_dev: Option<f64>,
}

/// The curve as it stood on (or just before) a given date.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSnapshot {
    pub requested: NaiveDate,
    /// Date of the latest row at or before `requested`.
    pub as_of: NaiveDate,
    pub points: Vec<(Maturity, f64)>,
}

/// Statistics for every column that has at least one value.
pub fn summary_stats(table: &YieldTable) -> Vec<MaturityStats> {
    table
        .columns
        .iter()
        .enumerate()
        .filter_map(|(col, &maturity)| {
            let observed: Vec<(NaiveDate, f64)> = table
                .rows
                .iter()
                .filter_map(|r| r.values[col].map(|v| (r.date, v)))
                .collect();
            let (&(first_date, _), &(last_date, current)) = (observed.first()?, observed.last()?);

            let n = observed.len();
            let values = observed.iter().map(|&(_, v)| v);
            let mean = values.clone().sum::<f64>() / n as f64;
            let min = values.clone().fold(f64::INFINITY, f64::min);
            let max = values.clone().fold(f64::NEG_INFINITY, f64::max);
            let std_dev = (n > 1).then(|| {
                let ss: f64 = values.map(|v| (v - mean).powi(2)).sum();
                (ss / (n as f64 - 1.0)).sqrt()
            });

            Some(MaturityStats {
                maturity,
                series_id: maturity.series_id(),
                first_date,
                last_date,
                count: n,
                current,
                mean,
                min,
                max,
                std_dev,
            })
        })
        .collect()
}

/// Latest value of each column at or before `date`.
///
/// `None` when the table has no row on or before `date`.
pub fn curve_snapshot(table: &YieldTable, date: NaiveDate) -> Option<CurveSnapshot> {
    let upto = table.rows.partition_point(|r| r.date <= date);
    let as_of = table.rows.get(upto.checked_sub(1)?)?.date;

    let points = table
        .columns
        .iter()
        .enumerate()
        .filter_map(|(col, &m)| {
            table.rows[..upto]
                .iter()
                .rev()
                .find_map(|r| r.values[col])
                .map(|v| (m, v))
        })
        .collect();

    Some(CurveSnapshot {
        requested: date,
        as_of,
        points,
    })
}

/// Snapshot at the table's last date.
pub fn latest_curve(table: &YieldTable) -> Option<CurveSnapshot> {
    curve_snapshot(table, table.last_date()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DateRange, Frequency, ObservationRow};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn table() -> YieldTable {
        let mut t = YieldTable::empty(
            vec![Maturity::Y2, Maturity::Y10],
            DateRange { start: d(2021, 1, 1), end: d(2021, 4, 1) },
            Frequency::Monthly,
            false,
        );
        t.rows = vec![
            ObservationRow { date: d(2021, 1, 1), values: vec![None, Some(1.0)] },
            ObservationRow { date: d(2021, 2, 1), values: vec![Some(0.2), Some(1.2)] },
            ObservationRow { date: d(2021, 3, 1), values: vec![Some(0.4), Some(1.6)] },
            ObservationRow { date: d(2021, 4, 1), values: vec![Some(0.3), None] },
        ];
        t
    }

    #[test]
    fn stats_per_column() {
        let stats = summary_stats(&table());
        assert_eq!(stats.len(), 2);

        let two = &stats[0];
        assert_eq!(two.maturity, Maturity::Y2);
        assert_eq!(two.series_id, "DGS2");
        assert_eq!(two.first_date, d(2021, 2, 1));
        assert_eq!(two.last_date, d(2021, 4, 1));
        assert_eq!(two.count, 3);
        assert_eq!(two.current, 0.3);
        assert!((two.mean - 0.3).abs() < 1e-12);
        assert_eq!((two.min, two.max), (0.2, 0.4));
        assert!((two.std_dev.unwrap() - 0.1).abs() < 1e-12);

        let ten = &stats[1];
        assert_eq!(ten.last_date, d(2021, 3, 1));
        assert_eq!(ten.current, 1.6);
    }

    #[test]
    fn single_value_has_no_std_dev_and_empty_columns_are_skipped() {
        let mut t = table();
        t.rows.truncate(1);
        let stats = summary_stats(&t);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].maturity, Maturity::Y10);
        assert_eq!(stats[0].std_dev, None);
    }

    #[test]
    fn snapshot_uses_closest_earlier_row() {
        let t = table();
        let s = curve_snapshot(&t, d(2021, 2, 20)).unwrap();
        assert_eq!(s.as_of, d(2021, 2, 1));
        assert_eq!(s.points, vec![(Maturity::Y2, 0.2), (Maturity::Y10, 1.2)]);

        // 10yr missing on the last row: its latest earlier value is used.
        let latest = latest_curve(&t).unwrap();
        assert_eq!(latest.points, vec![(Maturity::Y2, 0.3), (Maturity::Y10, 1.6)]);

        assert!(curve_snapshot(&t, d(2020, 12, 31)).is_none());
    }
}
