//! Interactive calibration from stdin.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use scale_config::{CalibrationFile, Config};
use scale_core::mocks::MemoryStore;
use scale_core::{
    CalibrationProcedure, CalibrationStore, CalibrationTable, CaptureCfg, CaptureStatus, JsonFileStore,
    StepView, run_calibration,
};
use scale_traits::MonotonicClock;
use serde_json::json;

use crate::hw::open_backend;
use crate::input::StdinInput;

pub struct CalibrateArgs<'a> {
    pub calibration: &'a Path,
    pub points: Option<Vec<i32>>,
    pub duration_ms: Option<u64>,
    pub dry_run: bool,
    pub json: bool,
}

pub fn run_calibrate(cfg: &Config, args: CalibrateArgs<'_>, shutdown: &Arc<AtomicBool>) -> eyre::Result<CalibrationTable> {
    let mut capture = CaptureCfg::from(&cfg.capture);
    if let Some(points) = args.points {
        capture.points = points;
    }
    if let Some(ms) = args.duration_ms {
        capture.duration_ms = ms;
    }
    let mut wizard = CalibrationProcedure::new(capture, (&cfg.encoder).into(), (&cfg.sensor).into())?;

    let backend = open_backend(cfg)?;
    let mut sensor = backend.sensor;
    let mut input = StdinInput::spawn(backend.sim_load);
    let mut store: Box<dyn CalibrationStore> = if args.dry_run {
        Box::new(MemoryStore::default())
    } else {
        Box::new(JsonFileStore::new(args.calibration))
    };

    let json = args.json;
    let mut shown: Option<StepView> = None;
    let table = run_calibration(
        &mut wizard,
        &mut sensor,
        &mut input,
        &mut store,
        &MonotonicClock::new(),
        Duration::from_millis(cfg.runner.wizard_poll_ms),
        shutdown,
        |status| print_status(status, json, &mut shown),
    )?;

    if args.dry_run {
        let file = CalibrationFile::from(&table);
        if json {
            println!("{}", json!({ "event": "table", "file": file }));
        } else {
            println!("{}", serde_json::to_string_pretty(&file)?);
        }
    } else if json {
        println!(
            "{}",
            json!({ "event": "saved", "path": args.calibration.display().to_string(), "points": table.len() })
        );
    } else {
        println!("Saved {} points to {}", table.len(), args.calibration.display());
    }
    Ok(table)
}

fn print_status(status: &CaptureStatus, json: bool, shown: &mut Option<StepView>) {
    match status {
        CaptureStatus::Adjusting(view) => {
            if shown.as_ref() == Some(view) {
                return;
            }
            *shown = Some(*view);
            if json {
                println!(
                    "{}",
                    json!({
                        "event": "adjust",
                        "step": view.index,
                        "count": view.count,
                        "nominal_g": view.nominal_g,
                        "target_g": view.target_g,
                    })
                );
            } else {
                println!(
                    "Step {}/{}: place {} g (target {} g). Turn with +N/-N, enter to capture.",
                    view.index + 1,
                    view.count,
                    view.nominal_g,
                    view.target_g
                );
            }
        }
        CaptureStatus::Capturing(p) => {
            *shown = None;
            if !p.report_due {
                return;
            }
            if json {
                println!(
                    "{}",
                    json!({
                        "event": "progress",
                        "step": p.step,
                        "elapsed_ms": p.elapsed_ms,
                        "duration_ms": p.duration_ms,
                        "percent": p.percent,
                        "samples": p.samples,
                    })
                );
            } else {
                println!(
                    "Capturing... {}/{} s ({}%), {} samples",
                    p.elapsed_s(),
                    p.total_s(),
                    p.percent,
                    p.samples
                );
            }
        }
        CaptureStatus::PointCaptured { point, failures } => {
            if json {
                println!(
                    "{}",
                    json!({
                        "event": "point",
                        "step": point.ordinal,
                        "target_g": point.target_g,
                        "adc_average": point.adc_average,
                        "samples": point.samples,
                        "failures": failures,
                    })
                );
            } else {
                println!(
                    "Point {}: {} g -> ADC {:.1} ({} samples, {} failed)",
                    point.ordinal + 1,
                    point.target_g,
                    point.adc_average,
                    point.samples,
                    failures
                );
            }
        }
        CaptureStatus::Complete(table) => {
            if json {
                println!("{}", json!({ "event": "complete", "points": table.len() }));
            } else {
                println!("Calibration complete: {} points", table.len());
            }
        }
    }
}
