//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and layers them over the loaded settings
//! - runs the assembly pipeline (FRED or sample data)
//! - prints reports/plots or launches the TUI
//! - writes optional exports

use chrono::{Days, Local, NaiveDate};
use clap::Parser;

use crate::cli::{CheckArgs, Command, DataArgs, ExportArgs, ShowArgs};
use crate::config::Settings;
use crate::data::FredClient;
use crate::domain::{DateRange, Maturity};
use crate::error::{AppError, ProviderError};

pub mod pipeline;

use pipeline::{Assembly, Pipeline};

/// Entry point for the `yc` binary.
pub fn run() -> Result<(), AppError> {
    // `yc` and `yc --source synthetic` behave like `yc tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Show(args) => handle_show(args),
        Command::Export(args) => handle_export(args),
        Command::Stats(args) => handle_stats(args),
        Command::Check(args) => handle_check(args),
        Command::Tui(args) => handle_tui(args),
    }
}

/// Settings from defaults, config file and environment, then CLI flags.
pub fn settings_from_args(args: &DataArgs) -> Result<Settings, AppError> {
    let mut settings = Settings::load(args.config.as_deref())?;
    apply_overrides(&mut settings, args);
    Ok(settings)
}

pub fn apply_overrides(settings: &mut Settings, args: &DataArgs) {
    if let Some(source) = args.source {
        settings.source = source;
    }
    if let Some(start) = args.start {
        settings.start_date = start;
    }
    if let Some(end) = args.end {
        settings.end_date = Some(end);
    }
    if let Some(keys) = &args.maturities {
        let mut keys = keys.clone();
        keys.sort();
        keys.dedup();
        settings.maturities = keys;
    }
    if let Some(min) = args.min_series {
        settings.coverage = pipeline::CoveragePolicy::new(min);
    }
    if let Some(freq) = args.frequency {
        settings.frequency = freq;
    }
    if let Some(seed) = args.seed {
        settings.generator.seed = seed;
    }
    if let Some(workers) = args.workers {
        settings.fetch_workers = workers.max(1);
    }
    if let Some(secs) = args.timeout {
        settings.fetch_timeout_secs = secs.max(1);
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Load settings and run the pipeline once.
fn assemble(args: &DataArgs) -> Result<(Settings, Assembly), AppError> {
    let settings = settings_from_args(args)?;
    let range = settings.date_range(today())?;
    let pipeline = Pipeline::from_settings(&settings);
    let assembly = pipeline.assemble_maturities(&settings.maturities, range, settings.source)?;
    Ok((settings, assembly))
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let (_, assembly) = assemble(&args.data)?;
    println!("{}", crate::report::format_assembly(&assembly));

    let table = &assembly.table;
    let snapshot = match args.date {
        Some(date) => crate::report::curve_snapshot(table, date),
        None => crate::report::latest_curve(table),
    };
    let Some(snapshot) = snapshot else {
        println!("No observations in the requested range.");
        return Ok(());
    };
    println!("{}", crate::report::format_snapshot(&snapshot));

    let animation = crate::present::frames(&table.slice(snapshot.as_of, snapshot.as_of));
    if let Some(frame) = animation.get(0) {
        let plot = crate::plot::render_curve_plot(frame, animation.provenance, args.width, args.height);
        println!("{plot}");
    }
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let (_, assembly) = assemble(&args.data)?;
    let table = &assembly.table;

    crate::io::export::write_table_csv(&args.out, table)?;
    println!(
        "Wrote {} ({}, {})",
        args.out.display(),
        crate::report::describe_table(table),
        table.provenance().label()
    );

    if let Some(path) = &args.stats {
        crate::io::export::write_stats_csv(path, &crate::report::summary_stats(table))?;
        println!("Wrote {}", path.display());
    }
    if let Some(path) = &args.frames {
        let animation = crate::present::frames(table);
        crate::io::frames::write_frames_json(path, &animation, table.requested_range, table.frequency)?;
        println!("Wrote {} ({} frames)", path.display(), animation.len());
    }
    if let Some(path) = &args.surface {
        let mesh = crate::present::mesh(table);
        crate::io::frames::write_surface_json(path, &mesh)?;
        let (rows, cols) = mesh.dims();
        println!("Wrote {} ({rows}x{cols} surface)", path.display());
    }
    Ok(())
}

fn handle_stats(args: DataArgs) -> Result<(), AppError> {
    let (_, assembly) = assemble(&args)?;
    println!(
        "Data: {}\n",
        crate::report::provenance_banner(assembly.table.provenance())
    );
    println!(
        "{}",
        crate::report::format_stats(&crate::report::summary_stats(&assembly.table))
    );
    Ok(())
}

/// Probe FRED with a handful of series and print their latest prints.
fn handle_check(args: CheckArgs) -> Result<(), AppError> {
    let settings = Settings::load(args.config.as_deref())?;
    let key = settings.fred_api_key.clone().ok_or(ProviderError::MissingCredential)?;
    let client = FredClient::new(key, settings.fetch_timeout_secs)?;

    let end = today();
    let start = end.checked_sub_days(Days::new(args.days)).unwrap_or(end);
    let range = DateRange::validated(start, end)?;
    let probes = [Maturity::M1, Maturity::M3, Maturity::Y10, Maturity::Y30];

    let mut ok = 0;
    for (m, result) in crate::data::probe(&client, &probes, range) {
        match result {
            Ok(Some((date, value))) => {
                ok += 1;
                println!("  {:<10} {value:>6.2}%  ({date})", m.display_name());
            }
            Ok(None) => println!("  {:<10} no data since {start}", m.display_name()),
            Err(err) => println!("  {:<10} error: {err}", m.display_name()),
        }
    }

    if ok == 0 {
        return Err(AppError::new(4, "Could not fetch Treasury yield data from FRED."));
    }
    println!("Successfully connected to FRED ({ok}/{} series).", probes.len());
    Ok(())
}

fn handle_tui(args: DataArgs) -> Result<(), AppError> {
    let settings = settings_from_args(&args)?;
    crate::tui::run(settings)
}

/// Rewrite argv so `yc` defaults to `yc tui`.
///
/// Rules:
/// - `yc`                      -> `yc tui`
/// - `yc --source synthetic`   -> `yc tui --source synthetic`
/// - `yc --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "show" | "export" | "stats" | "check" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
