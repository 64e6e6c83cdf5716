//! Command-line parsing for the Treasury yield-curve viewer.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline and presentation code. Flags here only override `config::Settings`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{Frequency, Maturity, SourcePreference};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "yc", version, about = "US Treasury yield curves (FRED with sample-data fallback)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Assemble the table, print a summary and an ASCII curve.
    Show(ShowArgs),
    /// Write the assembled table (and optionally stats/frames) to disk.
    Export(ExportArgs),
    /// Print per-maturity summary statistics.
    Stats(DataArgs),
    /// Check the FRED connection by fetching a few recent series.
    Check(CheckArgs),
    /// Launch the interactive TUI (default).
    ///
    /// Plays the yield curve through time, with a heatmap view and a banner
    /// showing whether the data is real or generated.
    Tui(DataArgs),
}

/// Options shared by every command that assembles a table.
#[derive(Debug, Args, Clone, Default)]
pub struct DataArgs {
    /// JSON config file (defaults to ./config.json when present).
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Preferred data source; `remote` falls back to sample data when FRED is unusable.
    #[arg(long, value_enum)]
    pub source: Option<SourcePreference>,

    /// Start date (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date_arg)]
    pub start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD); defaults to today.
    #[arg(long, value_parser = parse_date_arg)]
    pub end: Option<NaiveDate>,

    /// Comma-separated maturity keys, e.g. `3mo,2yr,10yr`.
    #[arg(short = 'm', long, value_enum, value_delimiter = ',')]
    pub maturities: Option<Vec<Maturity>>,

    /// Minimum number of FRED series that must load before real data is used.
    #[arg(long)]
    pub min_series: Option<usize>,

    /// Row frequency of the assembled table.
    #[arg(long, value_enum)]
    pub frequency: Option<Frequency>,

    /// Seed for generated sample data.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of concurrent FRED requests.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Per-request FRED timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Show the curve as of this date instead of the latest row.
    #[arg(long, value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Table CSV output path.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,

    /// Also write summary statistics CSV.
    #[arg(long, value_name = "CSV")]
    pub stats: Option<PathBuf>,

    /// Also write animation frames JSON.
    #[arg(long, value_name = "JSON")]
    pub frames: Option<PathBuf>,

    /// Also write the 3D surface mesh JSON.
    #[arg(long, value_name = "JSON")]
    pub surface: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CheckArgs {
    /// JSON config file (defaults to ./config.json when present).
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// How many days back to look for the latest observations.
    #[arg(long, default_value_t = 90)]
    pub days: u64,
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    crate::domain::parse_date(raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maturities_are_comma_separated() {
        let cli = Cli::try_parse_from(["yc", "show", "-m", "10yr,3mo", "--start", "2020-01-01"]).unwrap();
        let Command::Show(args) = cli.command else {
            panic!("expected show");
        };
        assert_eq!(args.data.maturities, Some(vec![Maturity::Y10, Maturity::M3]));
        assert_eq!(args.data.start, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(args.width, 100);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(Cli::try_parse_from(["yc", "stats", "-m", "11yr"]).is_err());
        assert!(Cli::try_parse_from(["yc", "stats", "--start", "2020-13-01"]).is_err());
        assert!(Cli::try_parse_from(["yc", "export"]).is_err());
    }

    #[test]
    fn source_and_frequency_values() {
        let cli = Cli::try_parse_from(["yc", "tui", "--source", "synthetic", "--frequency", "weekly"]).unwrap();
        let Command::Tui(args) = cli.command else {
            panic!("expected tui");
        };
        assert_eq!(args.source, Some(SourcePreference::Synthetic));
        assert_eq!(args.frequency, Some(Frequency::Weekly));
    }
}
