//! CSV exports of an assembled table and its summary statistics.
//!
//! Meant to be easy to consume in spreadsheets or downstream scripts. Every
//! table row carries a `source` column so provenance survives the export.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{DATE_FORMAT, Provenance, YieldTable};
use crate::error::AppError;
use crate::report::MaturityStats;

/// Write the table as `date,<key>...,source`. Absent values are empty cells.
pub fn write_table_csv(path: &Path, table: &YieldTable) -> Result<(), AppError> {
    let file = create(path)?;
    write_table(file, table)
}

pub fn write_stats_csv(path: &Path, stats: &[MaturityStats]) -> Result<(), AppError> {
    let file = create(path)?;
    write_stats(file, stats)
}

pub fn write_table<W: Write>(writer: W, table: &YieldTable) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["date".to_string()];
    header.extend(table.columns.iter().map(|m| m.key().to_string()));
    header.push("source".to_string());
    wtr.write_record(&header).map_err(csv_err)?;

    let source = match table.provenance() {
        Provenance::Real => "fred",
        Provenance::Synthetic => "sample",
    };
    for row in &table.rows {
        let mut record = Vec::with_capacity(row.values.len() + 2);
        record.push(row.date.format(DATE_FORMAT).to_string());
        record.extend(
            row.values
                .iter()
                .map(|v| v.map(|v| format!("{v:.4}")).unwrap_or_default()),
        );
        record.push(source.to_string());
        wtr.write_record(&record).map_err(csv_err)?;
    }

    wtr.flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush CSV: {e}")))
}

pub fn write_stats<W: Write>(writer: W, stats: &[MaturityStats]) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "maturity",
        "series_id",
        "start_date",
        "end_date",
        "data_points",
        "current_rate",
        "average_rate",
        "min_rate",
        "max_rate",
        "std_dev",
    ])
    .map_err(csv_err)?;

    for s in stats {
        let record = [
            s.maturity.key().to_string(),
            s.series_id.to_string(),
            s.first_date.to_string(),
            s.last_date.to_string(),
            s.count.to_string(),
            format!("{:.4}", s.current),
            format!("{:.4}", s.mean),
            format!("{:.4}", s.min),
            format!("{:.4}", s.max),
            s.std_dev.map(|v| format!("{v:.4}")).unwrap_or_default(),
        ];
        wtr.write_record(&record).map_err(csv_err)?;
    }

    wtr.flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush CSV: {e}")))
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn csv_err(e: csv::Error) -> AppError {
    AppError::new(4, format!("Failed to write export CSV row: {e}"))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{DateRange, Frequency, Maturity, ObservationRow};
    use crate::report::summary_stats;

    fn table() -> YieldTable {
        let d = |m| NaiveDate::from_ymd_opt(2020, m, 1).unwrap();
        let mut t = YieldTable::empty(
            vec![Maturity::M3, Maturity::Y10],
            DateRange { start: d(1), end: d(2) },
            Frequency::Monthly,
            false,
        );
        t.rows = vec![
            ObservationRow { date: d(1), values: vec![None, Some(1.88)] },
            ObservationRow { date: d(2), values: vec![Some(1.55), Some(1.51)] },
        ];
        t
    }

    #[test]
    fn table_csv_layout() {
        let mut buf = Vec::new();
        write_table(&mut buf, &table()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "date,3mo,10yr,source\n2020-01-01,,1.8800,fred\n2020-02-01,1.5500,1.5100,fred\n"
        );
    }

    #[test]
    fn stats_csv_written_to_file() {
        let path = std::env::temp_dir().join(format!("yc_stats_{}.csv", std::process::id()));
        write_stats_csv(&path, &summary_stats(&table())).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("maturity,series_id,start_date"));
        assert_eq!(lines[1], "3mo,DGS3MO,2020-02-01,2020-02-01,1,1.5500,1.5500,1.5500,1.5500,");
        assert!(lines[2].starts_with("10yr,DGS10,2020-01-01,2020-02-01,2,1.5100,1.6950,"));
    }

    #[test]
    fn unwritable_path_is_usage_error() {
        let path = Path::new("/nonexistent-dir/yc/out.csv");
        let err = write_table_csv(path, &table()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
