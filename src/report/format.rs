//! Formatted terminal output.
//!
//! Formatting lives in one place so the pipeline stays free of presentation
//! concerns and output changes stay localized.

use crate::app::pipeline::Assembly;
use crate::domain::{FetchOutcome, Provenance, YieldTable};
use crate::report::{CurveSnapshot, MaturityStats};

/// Header block: provenance, range, shape, fallback reason.
pub fn format_assembly(assembly: &Assembly) -> String {
    let t = &assembly.table;
    let mut out = String::new();

    out.push_str("=== yc - US Treasury Yield Curves ===\n");
    out.push_str(&format!("Data: {}\n", provenance_banner(t.provenance())));
    out.push_str(&format!(
        "Requested: {} to {} ({:?})\n",
        t.requested_range.start, t.requested_range.end, t.frequency
    ));
    match (t.first_date(), t.last_date()) {
        (Some(first), Some(last)) => out.push_str(&format!(
            "Rows: {} | {first} to {last} | maturities: {}\n",
            t.len(),
            t.columns.len()
        )),
        _ => out.push_str(&format!("Rows: 0 | maturities: {}\n", t.columns.len())),
    }
    if let Some(reason) = &assembly.fallback {
        out.push_str(&format!("Fallback: {reason}\n"));
    }

    if !assembly.outcomes.is_empty() {
        out.push('\n');
        out.push_str(&format_outcomes(&assembly.outcomes));
    }
    out
}

pub fn provenance_banner(p: Provenance) -> String {
    match p {
        Provenance::Real => format!("[REAL] {}", p.label()),
        Provenance::Synthetic => format!("[SAMPLE] {}", p.label()),
    }
}

/// Per-series fetch results.
pub fn format_outcomes(outcomes: &[FetchOutcome]) -> String {
    let mut out = String::new();
    out.push_str("Fetch results:\n");
    push_line(
        &mut out,
        format!("{:<6} {:<8} {:<6} {:>6} {}", "key", "series", "status", "obs", "error"),
    );
    push_line(&mut out, format!("{:-<6} {:-<8} {:-<6} {:->6} {:-<5}", "", "", "", "", ""));
    for o in outcomes {
        let status = if o.has_coverage() { "ok" } else { "FAIL" };
        push_line(
            &mut out,
            format!(
                "{:<6} {:<8} {:<6} {:>6} {}",
                o.maturity.key(),
                o.maturity.series_id(),
                status,
                o.observation_count,
                truncate(o.error_message.as_deref().unwrap_or(""), 60),
            ),
        );
    }
    out
}

pub fn format_stats(stats: &[MaturityStats]) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!(
            "{:<6} {:<10} {:<10} {:>6} {:>8} {:>8} {:>8} {:>8} {:>8}",
            "key", "first", "last", "n", "current", "mean", "min", "max", "std"
        ),
    );
    push_line(
        &mut out,
        format!(
            "{:-<6} {:-<10} {:-<10} {:->6} {:->8} {:->8} {:->8} {:->8} {:->8}",
            "", "", "", "", "", "", "", "", ""
        ),
    );
    for s in stats {
        push_line(
            &mut out,
            format!(
                "{:<6} {:<10} {:<10} {:>6} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8}",
                s.maturity.key(),
                s.first_date,
                s.last_date,
                s.count,
                s.current,
                s.mean,
                s.min,
                s.max,
                s.std_dev.map(|v| format!("{v:.3}")).unwrap_or_else(|| "-".to_string()),
            ),
        );
    }
    out
}

pub fn format_snapshot(snapshot: &CurveSnapshot) -> String {
    let mut out = String::new();
    out.push_str(&format!("Curve as of {}", snapshot.as_of));
    if snapshot.as_of != snapshot.requested {
        out.push_str(&format!(" (requested {})", snapshot.requested));
    }
    out.push('\n');
    for &(m, v) in &snapshot.points {
        out.push_str(&format!("  {:<10} {v:>6.2}%\n", m.display_name()));
    }
    out
}

/// One-line description of a table, used in logs and the TUI status bar.
pub fn describe_table(table: &YieldTable) -> String {
    match (table.first_date(), table.last_date()) {
        (Some(first), Some(last)) => format!(
            "{} rows x {} maturities, {first} to {last}",
            table.len(),
            table.columns.len()
        ),
        _ => format!("no rows x {} maturities", table.columns.len()),
    }
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::app::pipeline::FallbackReason;
    use crate::domain::{DateRange, Frequency, Maturity, ObservationRow};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn assembly_header_shows_provenance_and_fallback() {
        let mut table = YieldTable::empty(
            vec![Maturity::Y10],
            DateRange { start: d(2020, 1, 1), end: d(2020, 2, 1) },
            Frequency::Monthly,
            true,
        );
        table.rows.push(ObservationRow { date: d(2020, 1, 1), values: vec![Some(1.9)] });
        let assembly = Assembly {
            table,
            outcomes: vec![FetchOutcome {
                maturity: Maturity::Y10,
                succeeded: false,
                observation_count: 0,
                error_message: Some("provider returned status 500".to_string()),
            }],
            fallback: Some(FallbackReason::InsufficientCoverage { succeeded: 0, required: 1 }),
        };

        let txt = format_assembly(&assembly);
        assert!(txt.contains("[SAMPLE] SAMPLE DATA (Not real market data)"));
        assert!(txt.contains("Rows: 1 | 2020-01-01 to 2020-01-01 | maturities: 1"));
        assert!(txt.contains("Fallback: only 0 series loaded from FRED (need 1)"));
        assert!(txt.contains("10yr   DGS10    FAIL        0 provider returned status 500"));
    }

    #[test]
    fn snapshot_mentions_requested_date_when_different() {
        let s = CurveSnapshot {
            requested: d(2020, 1, 15),
            as_of: d(2020, 1, 1),
            points: vec![(Maturity::Y2, 1.5)],
        };
        let txt = format_snapshot(&s);
        assert_eq!(txt, "Curve as of 2020-01-01 (requested 2020-01-15)\n  2 Year       1.50%\n");
    }

    #[test]
    fn long_errors_are_truncated() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
