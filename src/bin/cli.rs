//! trackprep CLI - prepare GPS location tracks for HMM analysis
//!
//! Usage:
//!   trackprep segment <input.csv> [--max-gap <min>] [--min-duration <min>] [--output <file>]
//!   trackprep regularize <input.csv> [--interval <min>] [--output <file>]
//!   trackprep metrics <input.csv> [--latlng] [--output <file>]
//!   trackprep prepare <input.csv> [thresholds...] [--output <file>]
//!   trackprep check-model <spec.json> <metrics-input.csv> [--latlng]
//!
//! Input is CSV with `track_id,time,x,y` columns plus optional covariates.
//! Output goes to stdout unless `--output` is given.

use chrono::TimeDelta;
use clap::{Args, Parser, Subcommand};
use log::info;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use trackprep::{
    CoordinateSystem, GridConfig, LocationRecord, ModelSpec, MovementRecord, Result,
    SegmentConfig, TrackError, io, movement_metrics, pad_to_grid, segment_tracks_with_stats,
};

#[derive(Parser)]
#[command(name = "trackprep")]
#[command(about = "Prepare animal GPS tracks for hidden Markov model analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct SegmentArgs {
    /// Split wherever consecutive fixes are more than this many minutes apart
    #[arg(long, default_value = "120")]
    max_gap: f64,

    /// Drop sub-tracks spanning fewer than this many minutes
    #[arg(long, default_value = "1440")]
    min_duration: f64,
}

#[derive(Args)]
struct GridArgs {
    /// Grid interval in minutes
    #[arg(long, default_value = "60")]
    interval: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Split tracks at long gaps and drop short sub-tracks
    Segment {
        input: PathBuf,
        #[command(flatten)]
        segment: SegmentArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Pad tracks onto a regular time grid with empty rows
    Regularize {
        input: PathBuf,
        #[command(flatten)]
        grid: GridArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add step length and turning angle columns
    Metrics {
        input: PathBuf,
        /// Coordinates are longitude (x) and latitude (y)
        #[arg(long)]
        latlng: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Segment, regularize and compute metrics in one pass
    Prepare {
        input: PathBuf,
        #[command(flatten)]
        segment: SegmentArgs,
        #[command(flatten)]
        grid: GridArgs,
        #[arg(long)]
        latlng: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a JSON model specification against prepared tracks
    CheckModel {
        spec: PathBuf,
        input: PathBuf,
        #[arg(long)]
        latlng: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Segment {
            input,
            segment,
            output,
        } => {
            let records = segment_records(io::read_csv_file(&input)?, &segment)?;
            write_records(output.as_deref(), &records)
        }
        Commands::Regularize {
            input,
            grid,
            output,
        } => {
            let records = pad_to_grid(io::read_csv_file(&input)?, &grid_config(&grid)?)?;
            write_records(output.as_deref(), &records)
        }
        Commands::Metrics {
            input,
            latlng,
            output,
        } => {
            let rows = movement_metrics(io::read_csv_file(&input)?, coordinate_system(latlng));
            write_metrics(output.as_deref(), &rows)
        }
        Commands::Prepare {
            input,
            segment,
            grid,
            latlng,
            output,
        } => {
            let records = segment_records(io::read_csv_file(&input)?, &segment)?;
            if records.is_empty() {
                info!("[Prepare] No sub-track is long enough, nothing to regularize");
            }
            let padded = pad_to_grid(records, &grid_config(&grid)?)?;
            let rows = movement_metrics(padded, coordinate_system(latlng));
            write_metrics(output.as_deref(), &rows)
        }
        Commands::CheckModel {
            spec,
            input,
            latlng,
        } => {
            let spec = ModelSpec::from_json_reader(BufReader::new(File::open(&spec)?))?;
            let rows = movement_metrics(io::read_csv_file(&input)?, coordinate_system(latlng));
            spec.validate(&rows)?;
            println!(
                "Model OK: {} states, {:?} steps, {:?} angles, {} observations",
                spec.n_states,
                spec.step,
                spec.angle,
                rows.len()
            );
            Ok(())
        }
    }
}

/// Convert fractional minutes from the command line.
fn minutes(name: &'static str, value: f64) -> Result<TimeDelta> {
    if !value.is_finite() {
        return Err(TrackError::InvalidThreshold {
            name,
            reason: format!("{} is not a finite number of minutes", value),
        });
    }
    let ms = (value * 60_000.0).round();
    let out_of_range = || TrackError::InvalidThreshold {
        name,
        reason: format!("{} minutes is out of range", value),
    };
    // `as` saturates, so range-check before casting
    if !(i64::MIN as f64..i64::MAX as f64).contains(&ms) {
        return Err(out_of_range());
    }
    TimeDelta::try_milliseconds(ms as i64).ok_or_else(out_of_range)
}

fn segment_records(
    records: Vec<LocationRecord>,
    args: &SegmentArgs,
) -> Result<Vec<LocationRecord>> {
    let config = SegmentConfig {
        max_gap: minutes("max_gap", args.max_gap)?,
        min_duration: minutes("min_duration", args.min_duration)?,
    };
    let segmentation = segment_tracks_with_stats(records, &config)?;
    let stats = segmentation.stats;
    info!(
        "[Segment] Dropped {} short sub-tracks ({} records)",
        stats.dropped_sub_tracks, stats.dropped_records
    );
    Ok(segmentation.records)
}

fn grid_config(args: &GridArgs) -> Result<GridConfig> {
    Ok(GridConfig {
        interval: minutes("interval", args.interval)?,
        ..Default::default()
    })
}

fn coordinate_system(latlng: bool) -> CoordinateSystem {
    if latlng {
        CoordinateSystem::LatLng
    } else {
        CoordinateSystem::Planar
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout())),
    })
}

fn write_records(path: Option<&Path>, records: &[LocationRecord]) -> Result<()> {
    io::write_records(open_output(path)?, records)
}

fn write_metrics(path: Option<&Path>, rows: &[MovementRecord]) -> Result<()> {
    io::write_metrics(open_output(path)?, rows)
}
