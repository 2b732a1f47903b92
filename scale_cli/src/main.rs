#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod calibrate;
mod cli;
mod commands;
mod error_fmt;
mod hw;
mod input;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::{Report, WrapErr};
use scale_config::Config;
use scale_core::ScaleError;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::calibrate::{CalibrateArgs, run_calibrate};
use crate::cli::{Cli, Commands, DEFAULT_CONFIG, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        tracing::debug!(error = %e, "command failed");
        std::process::exit(exit_code_for_error(&e));
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    init_tracing(cli.json, &cli.log_level, &cfg.logging)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }

    let calibration: PathBuf = cli
        .calibration
        .clone()
        .unwrap_or_else(|| cfg.calibration.path.clone());

    match cli.cmd {
        Commands::Weigh { count, no_tare } => {
            commands::run_weigh(&cfg, &calibration, count, no_tare, cli.json, &shutdown)?;
        }
        Commands::Tare => {
            commands::run_tare(&cfg, &calibration, cli.json)?;
        }
        Commands::Calibrate {
            points,
            duration_ms,
            dry_run,
        } => {
            let args = CalibrateArgs {
                calibration: &calibration,
                points,
                duration_ms,
                dry_run,
                json: cli.json,
            };
            run_calibrate(&cfg, args, &shutdown)?;
        }
        Commands::SelfCheck => commands::run_self_check(&cfg, &calibration, cli.json)?,
    }
    Ok(())
}

/// Read `--config`, else the default path when it exists, else built-in defaults.
fn load_config(path: Option<&Path>) -> eyre::Result<Config> {
    let path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => Some(PathBuf::from(DEFAULT_CONFIG)).filter(|p| p.exists()),
    };
    let cfg = match path {
        Some(p) => {
            let text = std::fs::read_to_string(&p)
                .map_err(|e| Report::new(ScaleError::Config(format!("read {}: {e}", p.display()))))?;
            scale_config::load_toml(&text)
                .map_err(|e| Report::new(ScaleError::Config(format!("parse config {}: {e}", p.display()))))?
        }
        None => Config::default(),
    };
    cfg.validate()
        .map_err(|e| Report::new(ScaleError::Config(e.to_string())))?;
    Ok(cfg)
}

fn init_tracing(json: bool, level: &str, logging: &scale_config::Logging) -> eyre::Result<()> {
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(console_filter)
            .boxed()
    };
    let mut layers = vec![console];

    if let Some(file) = &logging.file {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file {file:?} has no file name"))?;
        let appender = match logging.rotation.as_deref().unwrap_or("never") {
            "daily" => tracing_appender::rolling::daily(dir, name),
            "hourly" => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_level = logging.level.as_deref().unwrap_or("info");
        layers.push(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(EnvFilter::new(file_level))
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| eyre::eyre!("init logging: {e}"))
}
