//! Polling loops: live weight readout and interactive calibration.
//!
//! Both loops are single-threaded and cooperative. They sleep on the
//! injected clock between ticks and stop when `shutdown` is raised.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use scale_traits::{Clock, InputEvent, OperatorInput, Sensor};

use crate::calibration::CalibrationTable;
use crate::capture::CalibrationProcedure;
use crate::config::LiveCfg;
use crate::error::{Report, Result, ScaleError, scale_error};
use crate::persistence::CalibrationStore;
use crate::reader::ScaleReader;
use crate::status::CaptureStatus;

/// One successful live reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub seq: u64,
    pub at_ms: u64,
    pub weight_g: f64,
    pub adc_average: Option<f64>,
}

/// Summary of a finished live session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveReport {
    pub cycles: u64,
    pub reads: u64,
    pub failures: u64,
    pub max_consecutive_failures: u32,
    pub tares: u32,
    pub last_weight_g: Option<f64>,
}

/// Let the load settle, then capture the starting tare.
///
/// Settle reads only warm the smoothing window; their failures are ignored.
pub fn initial_tare<S: Sensor>(
    reader: &mut ScaleReader<S>,
    settle_polls: u32,
    settle_interval: Duration,
) -> Result<f64> {
    let clock = reader.clock().clone();
    for i in 0..settle_polls {
        if let Err(e) = reader.read() {
            tracing::debug!(poll = i, error = %e, "settle read failed");
        }
        clock.sleep(settle_interval);
    }
    reader.tare()
}

/// Run the live readout until `shutdown`, `cfg.max_reads` cycles, or a fatal error.
///
/// A commit from `input` re-tares. Sample failures are counted and skipped;
/// hitting `cfg.max_consecutive_failures` in a row logs a warning once per streak.
/// A closed input source is not fatal; the loop keeps reading.
pub fn run_live<S, I, F>(
    reader: &mut ScaleReader<S>,
    cfg: &LiveCfg,
    input: &mut I,
    shutdown: &AtomicBool,
    mut on_reading: F,
) -> Result<LiveReport>
where
    S: Sensor,
    I: OperatorInput + ?Sized,
    F: FnMut(&Reading),
{
    let clock = reader.clock().clone();
    let epoch = clock.now();
    let poll = Duration::from_millis(cfg.poll_interval_ms);
    let escalate_at = cfg.max_consecutive_failures.max(1);

    let mut report = LiveReport::default();
    let mut consecutive: u32 = 0;
    let mut input_open = true;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("live readout interrupted");
            break;
        }
        if cfg.max_reads.is_some_and(|n| report.cycles >= n) {
            break;
        }

        while input_open {
            match input.poll_event() {
                Ok(Some(InputEvent::Commit)) => match reader.tare() {
                    Ok(offset) => {
                        report.tares += 1;
                        tracing::info!(offset_g = offset, "re-tared on operator request");
                    }
                    Err(e) if matches!(scale_error(&e), Some(ScaleError::TareCaptureFailed { .. })) => {
                        tracing::warn!(error = %e, "operator tare failed");
                    }
                    Err(e) => return Err(e),
                },
                Ok(Some(InputEvent::Encoder { delta, .. })) => {
                    tracing::trace!(delta, "encoder ignored during live readout");
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(error = %e, "operator input closed");
                    input_open = false;
                }
            }
        }

        match reader.read() {
            Ok(weight_g) => {
                consecutive = 0;
                report.reads += 1;
                report.last_weight_g = Some(weight_g);
                on_reading(&Reading {
                    seq: report.reads,
                    at_ms: clock.ms_since(epoch),
                    weight_g,
                    adc_average: reader.last_average(),
                });
            }
            Err(e) => match scale_error(&e) {
                Some(se) if se.is_transient() => {
                    report.failures += 1;
                    consecutive = consecutive.saturating_add(1);
                    report.max_consecutive_failures = report.max_consecutive_failures.max(consecutive);
                    if consecutive == escalate_at {
                        tracing::warn!(consecutive, error = %e, "sensor keeps failing");
                    } else {
                        tracing::debug!(consecutive, error = %e, "read failed");
                    }
                }
                _ => return Err(e),
            },
        }

        report.cycles += 1;
        clock.sleep(poll);
    }

    tracing::info!(
        cycles = report.cycles,
        reads = report.reads,
        failures = report.failures,
        "live readout finished"
    );
    Ok(report)
}

/// Drive `procedure` to completion and persist the finished table.
///
/// Operator input is drained only while adjusting; a commit starts the
/// capture. An empty capture in strict mode is reported and the step is
/// retried. Shutdown cancels any running capture and returns a `State` error.
#[allow(clippy::too_many_arguments)]
pub fn run_calibration<S, I, St, F>(
    procedure: &mut CalibrationProcedure,
    sensor: &mut S,
    input: &mut I,
    store: &mut St,
    clock: &dyn Clock,
    poll_interval: Duration,
    shutdown: &AtomicBool,
    mut on_status: F,
) -> Result<CalibrationTable>
where
    S: Sensor + ?Sized,
    I: OperatorInput + ?Sized,
    St: CalibrationStore + ?Sized,
    F: FnMut(&CaptureStatus),
{
    let epoch = clock.now();
    loop {
        if shutdown.load(Ordering::Relaxed) {
            if procedure.is_capturing() {
                procedure.cancel_capture()?;
            }
            return Err(Report::new(ScaleError::State(
                "calibration interrupted".into(),
            )));
        }
        let now = clock.ms_since(epoch);

        while procedure.is_adjusting() {
            match input.poll_event() {
                Ok(Some(InputEvent::Encoder { delta, at_ms })) => {
                    if let Some(target) = procedure.on_encoder(delta, at_ms) {
                        tracing::debug!(target_g = target, "target adjusted");
                    }
                }
                Ok(Some(InputEvent::Commit)) => procedure.commit(now)?,
                Ok(None) => break,
                Err(e) => {
                    return Err(Report::new(ScaleError::State(format!(
                        "operator input closed before calibration finished: {e}"
                    ))));
                }
            }
        }

        match procedure.poll(sensor, now) {
            Ok(CaptureStatus::Complete(table)) => {
                on_status(&CaptureStatus::Complete(table.clone()));
                store.save(&table)?;
                return Ok(table);
            }
            Ok(status) => on_status(&status),
            Err(e) if matches!(scale_error(&e), Some(ScaleError::CaptureEmpty { .. })) => {
                tracing::warn!(error = %e, "capture collected nothing, commit again to retry");
            }
            Err(e) => return Err(e),
        }

        clock.sleep(poll_interval);
    }
}
