//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Config file picked up when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "etc/scale_config.toml";

#[derive(Parser, Debug)]
#[command(name = "scale", version, about = "Load-cell scale CLI")]
pub struct Cli {
    /// Path to config TOML (defaults to etc/scale_config.toml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Calibration JSON file (overrides [calibration].path)
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Output JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the live weight. A line on stdin re-tares.
    Weigh {
        /// Stop after this many poll cycles
        #[arg(long, value_name = "N")]
        count: Option<u64>,
        /// Skip the start-up tare
        #[arg(long, action = ArgAction::SetTrue)]
        no_tare: bool,
    },
    /// Capture a tare offset and print it
    Tare,
    /// Interactive multi-point calibration driven by stdin
    #[command(
        long_about = "Interactive multi-point calibration.\n\nEach stdin line is one operator gesture:\n  +N / -N     turn the encoder N detents\n  c or empty  commit the current target and start the timed capture\n  load G      (simulation only) put G grams on the platform\n\nThe finished table is written to the calibration file unless --dry-run is set."
    )]
    Calibrate {
        /// Nominal weights in grams, comma separated (overrides [capture].points)
        #[arg(long, value_name = "G,G,...", value_delimiter = ',')]
        points: Option<Vec<i32>>,
        /// Capture window per point (overrides [capture].duration_ms)
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
        /// Print the table instead of saving it
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
    },
    /// Quick health check: config, one sensor read, calibration file
    SelfCheck,
}
