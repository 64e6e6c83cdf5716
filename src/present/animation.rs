//! Animated yield-curve frames.
//!
//! One frame per table row (thinned to at most `MAX_FRAMES`), each a set of
//! `(tenor_years, yield)` points. Axis bounds are global across the whole table
//! so the chart does not rescale while it plays.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Maturity, Provenance, YieldTable};
use crate::present::{MONTH_LABEL_FORMAT, sample_rows};

/// Lowest and highest opacity given to trail curves (oldest to newest).
const TRAIL_ALPHA_MIN: f64 = 0.1;
const TRAIL_ALPHA_SPAN: f64 = 0.4;

/// Default frame cap for long tables.
pub const MAX_FRAMES: usize = 150;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveFrame {
    pub date: NaiveDate,
    pub label: String,
    pub title: String,
    /// Present values only, in registry order.
    pub points: Vec<(f64, f64)>,
}

/// A previous frame drawn behind the current one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailFrame<'a> {
    pub frame: &'a CurveFrame,
    /// 0.1 for the oldest trail, approaching 0.5 for the newest.
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationFrames {
    pub provenance: Provenance,
    pub maturities: Vec<Maturity>,
    pub frames: Vec<CurveFrame>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl AnimationFrames {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CurveFrame> {
        self.frames.get(index)
    }

    /// Up to `max_trails` frames immediately before `index`, oldest first.
    pub fn trail(&self, index: usize, max_trails: usize) -> Vec<TrailFrame<'_>> {
        if max_trails == 0 || index == 0 {
            return Vec::new();
        }
        let end = index.min(self.frames.len());
        let start = end.saturating_sub(max_trails);
        self.frames[start..end]
            .iter()
            .enumerate()
            .map(|(i, frame)| TrailFrame {
                frame,
                alpha: TRAIL_ALPHA_MIN + TRAIL_ALPHA_SPAN * (i as f64 / max_trails as f64),
            })
            .collect()
    }
}

/// Build animation frames for `table`, at most `MAX_FRAMES` of them.
pub fn frames(table: &YieldTable) -> AnimationFrames {
    frames_with_limit(table, MAX_FRAMES)
}

/// Build at most `max_frames` frames (`0` for one per row).
pub fn frames_with_limit(table: &YieldTable, max_frames: usize) -> AnimationFrames {
    let frames: Vec<CurveFrame> = sample_rows(table.rows.len(), max_frames)
        .into_iter()
        .map(|i| &table.rows[i])
        .map(|row| CurveFrame {
            date: row.date,
            label: row.date.format(MONTH_LABEL_FORMAT).to_string(),
            title: frame_title(row.date),
            points: table
                .columns
                .iter()
                .zip(&row.values)
                .filter_map(|(m, v)| v.map(|y| (m.tenor_years(), y)))
                .collect(),
        })
        .collect();

    let max_tenor = table
        .columns
        .iter()
        .map(|m| m.tenor_years())
        .fold(0.0_f64, f64::max);
    let x_max = if max_tenor > 0.0 { max_tenor * 1.1 } else { 1.0 };
    let (lo, hi) = table.value_range().unwrap_or((0.0, 1.0));

    AnimationFrames {
        provenance: table.provenance(),
        maturities: table.columns.clone(),
        frames,
        x_bounds: [0.0, x_max],
        y_bounds: [lo - 0.5, hi + 0.5],
    }
}

pub fn frame_title(date: NaiveDate) -> String {
    format!("US Treasury Yield Curve - {}", date.format("%B %Y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DateRange, Frequency, ObservationRow};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_table(is_synthetic: bool) -> YieldTable {
        let mut t = YieldTable::empty(
            vec![Maturity::M3, Maturity::Y2, Maturity::Y10],
            DateRange { start: d(2023, 1, 1), end: d(2023, 3, 1) },
            Frequency::Monthly,
            is_synthetic,
        );
        t.rows = vec![
            ObservationRow { date: d(2023, 1, 1), values: vec![None, Some(4.1), Some(3.5)] },
            ObservationRow { date: d(2023, 2, 1), values: vec![Some(4.6), Some(4.4), Some(3.9)] },
            ObservationRow { date: d(2023, 3, 1), values: vec![Some(4.9), Some(4.0), Some(3.4)] },
        ];
        t
    }

    #[test]
    fn one_frame_per_row_with_labels() {
        let f = frames(&sample_table(false));
        assert_eq!(f.len(), 3);
        assert_eq!(f.provenance, Provenance::Real);
        assert_eq!(f.frames[0].label, "2023-01");
        assert_eq!(f.frames[1].title, "US Treasury Yield Curve - February 2023");
        // Absent 3mo value is skipped, not zeroed.
        assert_eq!(f.frames[0].points, vec![(2.0, 4.1), (10.0, 3.5)]);
        assert_eq!(f.frames[1].points.len(), 3);
    }

    #[test]
    fn bounds_are_global() {
        let f = frames(&sample_table(true));
        assert_eq!(f.provenance, Provenance::Synthetic);
        assert!((f.x_bounds[1] - 11.0).abs() < 1e-12);
        assert!((f.y_bounds[0] - 2.9).abs() < 1e-12);
        assert!((f.y_bounds[1] - 5.4).abs() < 1e-12);
    }

    #[test]
    fn trail_is_capped_and_fades_in() {
        let f = frames(&sample_table(false));
        assert!(f.trail(0, 20).is_empty());
        assert!(f.trail(2, 0).is_empty());

        let trail = f.trail(2, 20);
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].frame.date, d(2023, 1, 1));
        assert!((trail[0].alpha - 0.1).abs() < 1e-12);
        assert!(trail[1].alpha > trail[0].alpha);

        let short = f.trail(2, 1);
        assert_eq!(short.len(), 1);
        assert_eq!(short[0].frame.date, d(2023, 2, 1));
    }

    #[test]
    fn long_tables_are_capped_keeping_both_ends() {
        let start = d(1990, 1, 1);
        let mut t = YieldTable::empty(
            vec![Maturity::Y10],
            DateRange { start, end: d(2025, 12, 31) },
            Frequency::Daily,
            false,
        );
        t.rows = (0..9_000)
            .map(|i| ObservationRow {
                date: start + chrono::Duration::days(i),
                values: vec![Some(2.0 + i as f64 * 1e-4)],
            })
            .collect();

        let f = frames(&t);
        assert_eq!(f.len(), MAX_FRAMES);
        assert_eq!(f.frames[0].date, start);
        assert_eq!(f.frames[MAX_FRAMES - 1].date, t.last_date().unwrap());
        assert!(f.frames.windows(2).all(|w| w[0].date < w[1].date));
        // Bounds still cover rows that were thinned out.
        assert!((f.y_bounds[1] - (2.0 + 8_999.0 * 1e-4 + 0.5)).abs() < 1e-9);

        assert_eq!(frames_with_limit(&t, 0).len(), 9_000);
        assert_eq!(frames_with_limit(&t, 20).len(), 20);
    }

    #[test]
    fn empty_table_has_sane_bounds() {
        let mut t = sample_table(false);
        t.rows.clear();
        let f = frames(&t);
        assert!(f.is_empty());
        assert_eq!(f.y_bounds, [-0.5, 1.5]);
    }
}
