//! `weigh`, `tare` and `self-check` subcommands.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use eyre::Report;
use scale_config::Config;
use scale_core::hw_error::map_sensor_error;
use scale_core::{
    CalibrationStore, CalibrationTable, JsonFileStore, LiveCfg, LiveReport, Reading, ScaleReader,
    format_weight, initial_tare, run_live,
};
use scale_traits::Sensor;
use serde_json::json;

use crate::hw::{DynSensor, open_backend};
use crate::input::StdinInput;

fn build_reader(cfg: &Config, table: CalibrationTable, sensor: DynSensor) -> eyre::Result<ScaleReader<DynSensor>> {
    ScaleReader::builder()
        .with_sensor(sensor)
        .with_calibration(table)
        .with_filter((&cfg.filter).into())
        .with_tare((&cfg.tare).into())
        .with_timeouts((&cfg.sensor).into())
        .try_build()
}

pub fn run_weigh(
    cfg: &Config,
    calibration: &Path,
    count: Option<u64>,
    no_tare: bool,
    json: bool,
    shutdown: &Arc<AtomicBool>,
) -> eyre::Result<LiveReport> {
    let table = JsonFileStore::new(calibration).load()?;
    let backend = open_backend(cfg)?;
    let mut reader = build_reader(cfg, table, backend.sensor)?;

    if !no_tare {
        let settle = Duration::from_millis(cfg.tare.settle_interval_ms);
        match initial_tare(&mut reader, cfg.tare.settle_polls, settle) {
            Ok(offset) => tracing::info!(offset_g = offset, "start-up tare captured"),
            Err(e) => {
                // The session continues on the previous (zero) offset.
                tracing::warn!(error = %e, "start-up tare failed");
                if !json {
                    eprintln!("warning: {e}");
                }
            }
        }
    }

    let mut live = LiveCfg::from(&cfg.runner);
    live.max_reads = count;
    let mut input = StdinInput::spawn(backend.sim_load);
    let report = run_live(&mut reader, &live, &mut input, shutdown, |r| print_reading(r, json))?;

    if json {
        println!(
            "{}",
            json!({
                "event": "summary",
                "cycles": report.cycles,
                "reads": report.reads,
                "failures": report.failures,
                "max_consecutive_failures": report.max_consecutive_failures,
                "tares": report.tares,
                "last_weight_g": report.last_weight_g,
            })
        );
    } else {
        eprintln!(
            "{} readings, {} failed, {} re-tares",
            report.reads, report.failures, report.tares
        );
    }
    Ok(report)
}

fn print_reading(r: &Reading, json: bool) {
    if json {
        println!(
            "{}",
            json!({
                "event": "reading",
                "seq": r.seq,
                "t_ms": r.at_ms,
                "weight_g": r.weight_g,
                "display": format_weight(Some(r.weight_g)),
                "adc_average": r.adc_average,
            })
        );
    } else {
        println!("{} g", format_weight(Some(r.weight_g)));
    }
}

pub fn run_tare(cfg: &Config, calibration: &Path, json: bool) -> eyre::Result<f64> {
    let table = JsonFileStore::new(calibration).load()?;
    let backend = open_backend(cfg)?;
    let mut reader = build_reader(cfg, table, backend.sensor)?;
    let offset = reader.tare()?;
    if json {
        println!("{}", json!({ "event": "tare", "offset_g": offset }));
    } else {
        println!("tare offset: {offset:.1} g");
    }
    Ok(offset)
}

/// Run every check, print one line each, and return the first failure.
pub fn run_self_check(cfg: &Config, calibration: &Path, json: bool) -> eyre::Result<()> {
    let mut first_err: Option<Report> = None;

    let sensor_line = match open_backend(cfg).and_then(|mut b| {
        b.sensor
            .read(Duration::from_millis(cfg.sensor.read_timeout_ms))
            .map_err(|e| Report::new(map_sensor_error(&*e)))
    }) {
        Ok(raw) => json!({ "check": "sensor", "ok": true, "raw": raw }),
        Err(e) => {
            let line = json!({ "check": "sensor", "ok": false, "error": e.to_string() });
            first_err.get_or_insert(e);
            line
        }
    };

    let calibration_line = match JsonFileStore::new(calibration).load() {
        Ok(table) => {
            let weights: Vec<i32> = table.points().iter().map(|p| p.target_g).collect();
            json!({
                "check": "calibration",
                "ok": true,
                "points": table.len(),
                "min_g": weights.iter().min(),
                "max_g": weights.iter().max(),
            })
        }
        Err(e) => {
            let line = json!({ "check": "calibration", "ok": false, "error": e.to_string() });
            first_err.get_or_insert(e);
            line
        }
    };

    let lines = [json!({ "check": "config", "ok": true }), sensor_line, calibration_line];
    for line in &lines {
        if json {
            println!("{line}");
        } else {
            let status = if line["ok"] == true { "ok" } else { "FAILED" };
            let detail = match (line["check"].as_str(), line["ok"].as_bool()) {
                (_, Some(false)) => line["error"].as_str().unwrap_or_default().to_string(),
                (Some("sensor"), _) => format!("raw {}", line["raw"]),
                (Some("calibration"), _) => {
                    format!("{} points, {}..{} g", line["points"], line["min_g"], line["max_g"])
                }
                _ => String::new(),
            };
            println!("{:<12} {status:<6} {detail}", line["check"].as_str().unwrap_or_default());
        }
    }

    first_err.map_or(Ok(()), Err)
}
