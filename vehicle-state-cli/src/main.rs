//! Vehicle State Replay CLI
//!
//! Command-line front end for the vehicle-state-decoder library. It replays
//! recorded per-cycle signal tables through the state decoder and adds:
//! - Per-cycle snapshot output (JSON lines or text)
//! - Staleness accounting against the catalog's freshness checks
//! - A per-file summary report
//!
//! Each replay file gets its own decoder and session, so files are
//! processed in parallel.

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use vehicle_state_decoder::{DecoderConfig, StateDecoder, VehicleVariant};

mod config;
mod replay;
mod report;

use config::OutputFormat;
use replay::ReplayReader;
use report::ReplaySummary;

/// Vehicle State Replay - Decode recorded signal logs into vehicle state
#[derive(Parser, Debug)]
#[command(name = "vehicle-state-cli")]
#[command(about = "Replay recorded CAN signal tables through the vehicle state decoder", long_about = None)]
#[command(version)]
struct Args {
    /// Replay file, one JSON object per cycle (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    replay: Vec<PathBuf>,

    /// Vehicle variant (e.g. "byd_tang", "BYD QIN 2014")
    #[arg(long, value_name = "VARIANT")]
    variant: Option<String>,

    /// DBC file to read the gear code table from
    #[arg(long, value_name = "FILE")]
    dbc: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for per-file state logs (default: stdout)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Snapshot output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Maximum number of cycles to decode per file
    #[arg(long, value_name = "COUNT")]
    max_cycles: Option<usize>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

/// Effective settings after merging the config file and flags
#[derive(Debug, Clone)]
struct Settings {
    files: Vec<PathBuf>,
    variant: VehicleVariant,
    dbc: Option<PathBuf>,
    format: OutputFormat,
    output_dir: Option<PathBuf>,
    decoder: DecoderConfig,
    max_cycles: Option<usize>,
}

/// Result of replaying one file
struct ReplayOutcome {
    summary: ReplaySummary,
    /// Snapshot lines when writing to stdout
    lines: Vec<String>,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Vehicle State Replay CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", vehicle_state_decoder::VERSION);

    let settings = resolve_settings(&args)?;

    if settings.files.is_empty() {
        println!("Vehicle State Replay - No input specified");
        println!("\nQuick Start:");
        println!("  vehicle-state-cli --variant byd_tang --replay drive.jsonl");
        println!("  vehicle-state-cli --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    if let Some(dir) = &settings.output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
    }

    let outcomes: Vec<(PathBuf, Result<ReplayOutcome>)> = settings
        .files
        .par_iter()
        .map(|path| (path.clone(), replay_file(path, &settings)))
        .collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failures = 0;

    for (path, outcome) in outcomes {
        match outcome {
            Ok(outcome) => {
                for line in &outcome.lines {
                    writeln!(out, "{}", line)?;
                }
                if !args.quiet {
                    write!(out, "{}", outcome.summary.render_txt())?;
                }
            }
            Err(e) => {
                failures += 1;
                log::error!("Replay of {:?} failed: {:#}", path, e);
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} replay files failed", failures, settings.files.len());
    }

    Ok(())
}

/// Merge the optional config file with command line flags (flags win)
fn resolve_settings(args: &Args) -> Result<Settings> {
    let app = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => config::AppConfig::default(),
    };

    let variant = match &args.variant {
        Some(name) => name
            .parse::<VehicleVariant>()
            .with_context(|| format!("Invalid --variant {:?}", name))?,
        None => match app.vehicle.variant {
            Some(variant) => variant,
            None if args.replay.is_empty() && app.input.files.is_empty() => {
                // Nothing to replay; the variant is irrelevant
                VehicleVariant::BydTang
            }
            None => bail!("No vehicle variant given (use --variant or [vehicle] variant)"),
        },
    };

    let files = if args.replay.is_empty() {
        app.input.files
    } else {
        args.replay.clone()
    };

    Ok(Settings {
        files,
        variant,
        dbc: args.dbc.clone().or(app.vehicle.dbc),
        format: args.format.unwrap_or(app.output.format),
        output_dir: args.output_dir.clone().or(app.output.output_dir),
        decoder: app.decoder,
        max_cycles: args.max_cycles,
    })
}

/// Replay one file through a fresh decoder and session
fn replay_file(path: &Path, settings: &Settings) -> Result<ReplayOutcome> {
    log::info!("Replaying {:?} as {}", path, settings.variant);

    let mut decoder = StateDecoder::with_config(settings.variant, settings.decoder.clone());
    if let Some(dbc) = &settings.dbc {
        decoder
            .load_gear_table(dbc)
            .with_context(|| format!("Failed to load gear table from {:?}", dbc))?;
    }

    let mut session = decoder.new_session();
    let mut cp = decoder.parsed_signals();
    let checks = decoder.catalog().checks().to_vec();
    let period = Duration::microseconds(1_000_000 / i64::from(settings.decoder.control_hz.max(1)));

    let mut summary = ReplaySummary::new(path.to_path_buf(), settings.variant, session.lane_keep_enabled());
    let mut lines = Vec::new();
    let mut last_timestamp = None;

    for (n, cycle) in ReplayReader::open(path)?.enumerate() {
        if settings.max_cycles.is_some_and(|max| n >= max) {
            log::debug!("Stopping {:?} after {} cycles", path, n);
            break;
        }
        let cycle = cycle?;

        // Cycles without a recorded time advance by one control period
        let timestamp = cycle
            .timestamp
            .or_else(|| last_timestamp.map(|t| t + period))
            .unwrap_or_else(Utc::now);
        last_timestamp = Some(timestamp);

        cycle.apply(&mut cp, timestamp);

        let stale = cp.stale_messages(&checks, settings.decoder.control_hz, timestamp);
        if !stale.is_empty() {
            log::debug!("Cycle {}: stale inputs {:?}", n, stale);
        }

        let state = decoder.update(&mut session, &cp);
        summary.record(&state, !stale.is_empty());

        lines.push(match settings.format {
            OutputFormat::Json => serde_json::to_string(&state)?,
            OutputFormat::Txt => report::format_state_line(n, &state),
        });
    }

    log::info!("Decoded {} cycles from {:?}", summary.cycles, path);

    if let Some(dir) = &settings.output_dir {
        let out_path = output_path(dir, path, settings.format);
        write_lines(&out_path, &lines)?;
        log::info!("Wrote {:?}", out_path);
        lines.clear();
    }

    Ok(ReplayOutcome { summary, lines })
}

/// `<dir>/<stem>.states.<ext>`
fn output_path(dir: &Path, input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("replay");
    dir.join(format!("{}.states.{}", stem, format.extension()))
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
