// WAM Realtime - Realtime WAM input driver
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # WAM Realtime
//!
//! Polls the space weather products under `--path` and writes gap-free
//! per-minute WAM inputs, one segment at a time.
//!
//! ## Usage
//!
//! ```bash
//! # Follow realtime data in 15-minute segments
//! wam-realtime --start 202102170015 --end 202102180015 --path /data --lock-dir /run/wam
//!
//! # One-shot: a single day from archived files, no waiting
//! wam-realtime --start 202006010000 --duration 1440 --no-wait --netcdf wam_input.nc
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;
use wam_input::{ConfigError, DriverConfig, RealtimeDriver, SourceMode, SystemClock, TimePoint};

/// Data-source selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Realtime L1 solar wind and hemispheric power
    Observed,
    /// Kp/F10.7 bulletin only, everything else from relaxation formulas
    Derived,
}

impl From<Mode> for SourceMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Observed => SourceMode::Observed,
            Mode::Derived => SourceMode::Derived,
        }
    }
}

/// WAM realtime input driver
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// First output minute (YYYYMMDDhhmm)
    #[arg(short, long)]
    start: Option<String>,

    /// Stop once this minute is reached (YYYYMMDDhhmm)
    #[arg(short, long)]
    end: Option<String>,

    /// Segment length in minutes
    #[arg(short, long)]
    duration: Option<u32>,

    /// Root of the input tree
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Text output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// netCDF output file
    #[arg(long)]
    netcdf: Option<PathBuf>,

    /// Skip the text output (netCDF only)
    #[arg(long)]
    no_text: bool,

    /// Extend existing outputs and resume after their last row
    #[arg(short, long)]
    append: bool,

    /// Coupled-model run
    #[arg(long)]
    coupled: bool,

    /// Data sources
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Minutes to wait for late data before processing anyway
    #[arg(long)]
    max_wait: Option<u32>,

    /// Seconds between availability polls
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Directory for per-segment lock markers
    #[arg(long)]
    lock_dir: Option<PathBuf>,

    /// Process immediately; without --end, a single segment
    #[arg(long)]
    no_wait: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Merge the config file and flags
fn build_config(args: &Args) -> Result<DriverConfig, ConfigError> {
    let (mut config, file_end) = match &args.config {
        Some(path) => DriverConfig::from_json_file_with_end(path)?,
        None => (DriverConfig::default(), false),
    };

    if let Some(start) = &args.start {
        config.start = TimePoint::parse_compact(start)?;
    }
    if let Some(minutes) = args.duration {
        config.segment_minutes = minutes;
    }
    match &args.end {
        Some(end) => config.end = TimePoint::parse_compact(end)?,
        None if args.no_wait && !file_end => {
            config.end = config.start.plus_minutes(config.segment_minutes as i64)
        }
        None => {}
    }
    if let Some(path) = &args.path {
        config.sources.root = path.clone();
    }
    if let Some(mode) = args.mode {
        config.sources.mode = mode.into();
    }
    if let Some(output) = &args.output {
        config.output.text_path = Some(output.clone());
    }
    if args.no_text {
        config.output.text_path = None;
    }
    if let Some(netcdf) = &args.netcdf {
        config.output.netcdf_path = Some(netcdf.clone());
    }
    if let Some(dir) = &args.lock_dir {
        config.output.lock_dir = Some(dir.clone());
    }
    if let Some(minutes) = args.max_wait {
        config.max_wait_minutes = minutes;
    }
    if let Some(secs) = args.poll_interval {
        config.poll_interval_secs = secs;
    }
    config.output.append |= args.append;
    config.output.coupled |= args.coupled;
    if args.no_wait {
        config.wait_for_data = false;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("WAM realtime v{}", env!("CARGO_PKG_VERSION"));

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut driver = match RealtimeDriver::from_config(config, SystemClock) {
        Ok(driver) => driver,
        Err(e) => {
            error!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let stats = driver.run();
    info!(
        "Committed {} segments ({} forced, {} retried)",
        stats.committed, stats.forced, stats.failed_commits
    );
    ExitCode::SUCCESS
}
