//! Multi-point calibration capture.
//!
//! The procedure walks an ordered list of nominal weights. For each one the
//! operator fine-tunes the target with the encoder, commits, and a timed
//! capture averages raw samples. The capture is a sub-state re-entered on
//! every [`CalibrationProcedure::poll`]; nothing here sleeps.

use std::time::Duration;

use scale_traits::Sensor;

use crate::calibration::{CalibrationPoint, CalibrationTable};
use crate::config::{CaptureCfg, MomentumCfg, Timeouts};
use crate::error::{Report, Result, ScaleError};
use crate::hw_error::map_sensor_error;
use crate::momentum::MomentumController;
use crate::status::{CaptureProgress, CaptureStatus, StepView};

#[derive(Debug, Clone)]
struct CaptureWindow {
    step: usize,
    target_g: i32,
    started_ms: u64,
    last_sample_ms: Option<u64>,
    last_report_ms: u64,
    sum: i64,
    samples: u32,
    failures: u32,
}

impl CaptureWindow {
    fn open(step: usize, target_g: i32, now_ms: u64) -> Self {
        Self {
            step,
            target_g,
            started_ms: now_ms,
            last_sample_ms: None,
            last_report_ms: now_ms,
            sum: 0,
            samples: 0,
            failures: 0,
        }
    }

    /// Advance the window by one poll. `None` once the duration has elapsed.
    fn tick<S: Sensor + ?Sized>(
        &mut self,
        cfg: &CaptureCfg,
        sensor: &mut S,
        timeout: Duration,
        now_ms: u64,
    ) -> Option<CaptureProgress> {
        let elapsed = now_ms.saturating_sub(self.started_ms);
        if elapsed >= cfg.duration_ms {
            return None;
        }

        let due = self
            .last_sample_ms
            .is_none_or(|t| now_ms.saturating_sub(t) >= cfg.sample_interval_ms);
        if due {
            self.last_sample_ms = Some(now_ms);
            match sensor.read(timeout) {
                Ok(raw) => {
                    self.sum += i64::from(raw);
                    self.samples += 1;
                    tracing::trace!(step = self.step, raw, "capture sample");
                }
                Err(e) => {
                    self.failures += 1;
                    let err = map_sensor_error(e.as_ref());
                    tracing::debug!(step = self.step, error = %err, "capture sample failed");
                }
            }
        }

        let report_due = now_ms.saturating_sub(self.last_report_ms) >= cfg.progress_interval_ms;
        if report_due {
            self.last_report_ms = now_ms;
        }
        let pct = (elapsed.saturating_mul(100) / cfg.duration_ms.max(1)).min(100);
        Some(CaptureProgress {
            step: self.step,
            elapsed_ms: elapsed,
            duration_ms: cfg.duration_ms,
            samples: self.samples,
            failures: self.failures,
            percent: u8::try_from(pct).unwrap_or(100),
            report_due,
        })
    }

    fn average(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.sum as f64 / f64::from(self.samples)
        }
    }
}

#[derive(Debug, Clone)]
enum Phase {
    Adjusting { step: usize },
    Capturing(CaptureWindow),
    Complete(CalibrationTable),
}

/// Sequential calibration capture over the configured nominal weights.
#[derive(Debug, Clone)]
pub struct CalibrationProcedure {
    cfg: CaptureCfg,
    timeouts: Timeouts,
    momentum: MomentumController,
    targets: Vec<i32>,
    points: Vec<CalibrationPoint>,
    phase: Phase,
}

impl CalibrationProcedure {
    pub fn new(cfg: CaptureCfg, momentum: MomentumCfg, timeouts: Timeouts) -> Result<Self> {
        if cfg.points.len() < CalibrationTable::MIN_POINTS {
            return Err(Report::new(ScaleError::Config(format!(
                "calibration needs at least {} points, got {}",
                CalibrationTable::MIN_POINTS,
                cfg.points.len()
            ))));
        }
        if cfg.duration_ms == 0 {
            return Err(Report::new(ScaleError::Config(
                "capture duration must be >= 1 ms".into(),
            )));
        }
        if let Some(&g) = cfg.points.iter().find(|&&g| g < momentum.min_g || g > momentum.max_g) {
            return Err(Report::new(ScaleError::Config(format!(
                "calibration point {g} g outside adjustable range {}..={} g",
                momentum.min_g, momentum.max_g
            ))));
        }
        let targets = cfg.points.clone();
        Ok(Self {
            momentum: MomentumController::new(momentum),
            targets,
            points: Vec::with_capacity(cfg.points.len()),
            phase: Phase::Adjusting { step: 0 },
            cfg,
            timeouts,
        })
    }

    pub fn step_count(&self) -> usize {
        self.cfg.points.len()
    }

    /// Points captured so far, in capture order.
    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    pub fn is_adjusting(&self) -> bool {
        matches!(self.phase, Phase::Adjusting { .. })
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.phase, Phase::Capturing(_))
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Complete(_))
    }

    /// Finished table, once every step is captured.
    pub fn table(&self) -> Option<&CalibrationTable> {
        match &self.phase {
            Phase::Complete(t) => Some(t),
            _ => None,
        }
    }

    /// Operator view of the current step; `None` once complete.
    pub fn view(&self) -> Option<StepView> {
        match &self.phase {
            Phase::Adjusting { step } => Some(self.step_view(*step)),
            Phase::Capturing(w) => Some(self.step_view(w.step)),
            Phase::Complete(_) => None,
        }
    }

    fn step_view(&self, step: usize) -> StepView {
        StepView {
            index: step,
            count: self.step_count(),
            nominal_g: self.cfg.points.get(step).copied().unwrap_or(0),
            target_g: self.targets.get(step).copied().unwrap_or(0),
        }
    }

    /// Feed an encoder event. Only honoured while adjusting; returns the new target.
    pub fn on_encoder(&mut self, delta: i32, at_ms: u64) -> Option<i32> {
        let Phase::Adjusting { step } = self.phase else {
            tracing::debug!(delta, "encoder ignored outside adjusting");
            return None;
        };
        let current = self.targets[step];
        let next = self.momentum.adjust(current, delta, at_ms);
        self.targets[step] = next;
        Some(next)
    }

    /// Confirm the current target and start the timed capture.
    pub fn commit(&mut self, now_ms: u64) -> Result<()> {
        let Phase::Adjusting { step } = self.phase else {
            return Err(Report::new(ScaleError::State(
                "commit is only valid while adjusting".into(),
            )));
        };
        let target_g = self.targets[step];
        tracing::info!(
            step,
            target_g,
            duration_ms = self.cfg.duration_ms,
            "capture started"
        );
        self.phase = Phase::Capturing(CaptureWindow::open(step, target_g, now_ms));
        Ok(())
    }

    /// Abort the running capture and go back to adjusting the same step.
    pub fn cancel_capture(&mut self) -> Result<()> {
        let Phase::Capturing(w) = &self.phase else {
            return Err(Report::new(ScaleError::State(
                "no capture in progress".into(),
            )));
        };
        let step = w.step;
        tracing::info!(step, samples = w.samples, "capture cancelled");
        self.phase = Phase::Adjusting { step };
        Ok(())
    }

    /// Discard everything and start over at the first step.
    pub fn restart(&mut self) {
        self.targets = self.cfg.points.clone();
        self.points.clear();
        self.momentum.reset();
        self.phase = Phase::Adjusting { step: 0 };
        tracing::info!("calibration restarted");
    }

    /// Advance the procedure by one poll tick.
    ///
    /// While capturing, samples the sensor at most once per tick and only when
    /// the sample interval has passed. Sensor failures are counted, never fatal.
    pub fn poll<S: Sensor + ?Sized>(&mut self, sensor: &mut S, now_ms: u64) -> Result<CaptureStatus> {
        if let Phase::Adjusting { step } = self.phase {
            return Ok(CaptureStatus::Adjusting(self.step_view(step)));
        }
        if let Phase::Complete(table) = &self.phase {
            return Ok(CaptureStatus::Complete(table.clone()));
        }

        let timeout = Duration::from_millis(self.timeouts.sensor_ms);
        if let Phase::Capturing(win) = &mut self.phase {
            if let Some(progress) = win.tick(&self.cfg, sensor, timeout, now_ms) {
                return Ok(CaptureStatus::Capturing(progress));
            }
            let win = win.clone();
            return self.finish(&win);
        }
        Err(Report::new(ScaleError::State("unexpected phase".into())))
    }

    fn finish(&mut self, win: &CaptureWindow) -> Result<CaptureStatus> {
        if win.samples == 0 {
            if self.cfg.reject_empty {
                tracing::warn!(step = win.step, failures = win.failures, "capture empty, retry step");
                self.phase = Phase::Adjusting { step: win.step };
                return Err(Report::new(ScaleError::CaptureEmpty { step: win.step }));
            }
            tracing::warn!(
                step = win.step,
                failures = win.failures,
                "capture collected no samples, recording average 0"
            );
        }

        let point = CalibrationPoint {
            ordinal: win.step,
            nominal_g: self.cfg.points.get(win.step).copied().unwrap_or(0),
            target_g: win.target_g,
            adc_average: win.average(),
            samples: win.samples,
        };
        self.points.push(point);
        tracing::info!(
            step = point.ordinal,
            weight_g = point.target_g,
            adc_average = point.adc_average,
            samples = point.samples,
            failures = win.failures,
            "calibration point captured"
        );

        let next = win.step + 1;
        if next >= self.step_count() {
            let table = CalibrationTable::new(self.points.clone())?;
            tracing::info!(points = table.len(), "calibration capture complete");
            self.phase = Phase::Complete(table);
        } else {
            self.phase = Phase::Adjusting { step: next };
        }
        Ok(CaptureStatus::PointCaptured {
            point,
            failures: win.failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::scale_error;
    use crate::mocks::ScriptedSensor;
    use rstest::rstest;

    fn cfg(points: Vec<i32>) -> CaptureCfg {
        CaptureCfg {
            points,
            duration_ms: 1_000,
            sample_interval_ms: 100,
            progress_interval_ms: 500,
            reject_empty: false,
        }
    }

    fn proc_with(points: Vec<i32>) -> CalibrationProcedure {
        CalibrationProcedure::new(cfg(points), MomentumCfg::default(), Timeouts::default()).unwrap()
    }

    /// Poll every 50 ms from `start` until the step finishes.
    fn run_window(
        p: &mut CalibrationProcedure,
        sensor: &mut ScriptedSensor,
        start: u64,
    ) -> (CaptureStatus, u64) {
        let mut now = start;
        loop {
            let st = p.poll(sensor, now).unwrap();
            if !matches!(st, CaptureStatus::Capturing(_)) {
                return (st, now);
            }
            now += 50;
        }
    }

    #[test]
    fn needs_two_points() {
        let err = CalibrationProcedure::new(cfg(vec![0]), MomentumCfg::default(), Timeouts::default())
            .unwrap_err();
        assert!(matches!(scale_error(&err), Some(ScaleError::Config(_))));
    }

    #[rstest]
    #[case(vec![0, 60_000])]
    #[case(vec![-100, 1_000])]
    fn points_outside_adjustable_range_are_rejected(#[case] points: Vec<i32>) {
        let err = CalibrationProcedure::new(cfg(points), MomentumCfg::default(), Timeouts::default())
            .unwrap_err();
        match scale_error(&err) {
            Some(ScaleError::Config(msg)) => assert!(msg.contains("outside adjustable range"), "{msg}"),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn range_edges_are_accepted() {
        let p = proc_with(vec![0, 50_000]);
        assert_eq!(p.view().unwrap().target_g, 0);
    }

    #[test]
    fn commit_outside_adjusting_is_a_state_error() {
        let mut p = proc_with(vec![0, 100]);
        p.commit(0).unwrap();
        let err = p.commit(10).unwrap_err();
        assert!(matches!(scale_error(&err), Some(ScaleError::State(_))));
    }

    #[test]
    fn samples_once_per_interval_and_averages() {
        let mut p = proc_with(vec![0, 100]);
        let mut s = ScriptedSensor::constant(1000);
        p.commit(0).unwrap();
        let (st, _) = run_window(&mut p, &mut s, 0);
        let CaptureStatus::PointCaptured { point, failures } = st else {
            panic!("expected captured point, got {st:?}");
        };
        assert_eq!(point.samples, 10);
        assert_eq!(failures, 0);
        assert_eq!(point.adc_average, 1000.0);
        assert_eq!(p.view().unwrap().index, 1);
    }

    #[test]
    fn failures_are_counted_not_fatal() {
        let mut p = proc_with(vec![0, 100]);
        let mut s = ScriptedSensor::new([Some(10), None, Some(20), None]).then_constant(30);
        p.commit(0).unwrap();
        let (st, _) = run_window(&mut p, &mut s, 0);
        let CaptureStatus::PointCaptured { point, failures } = st else {
            panic!("expected captured point");
        };
        assert_eq!(failures, 2);
        assert_eq!(point.samples, 8);
        assert_eq!(point.adc_average, (10 + 20 + 6 * 30) as f64 / 8.0);
    }

    #[test]
    fn empty_capture_records_zero_by_default() {
        let mut p = proc_with(vec![0, 100]);
        let mut s = ScriptedSensor::failing();
        p.commit(0).unwrap();
        let (st, _) = run_window(&mut p, &mut s, 0);
        let CaptureStatus::PointCaptured { point, .. } = st else {
            panic!("expected captured point");
        };
        assert_eq!(point.samples, 0);
        assert_eq!(point.adc_average, 0.0);
        assert!(p.is_adjusting());
    }

    #[test]
    fn empty_capture_can_be_rejected() {
        let mut c = cfg(vec![0, 100]);
        c.reject_empty = true;
        let mut p = CalibrationProcedure::new(c, MomentumCfg::default(), Timeouts::default()).unwrap();
        let mut s = ScriptedSensor::failing();
        p.commit(0).unwrap();
        let mut now = 0;
        let err = loop {
            match p.poll(&mut s, now) {
                Ok(_) => now += 50,
                Err(e) => break e,
            }
        };
        assert_eq!(scale_error(&err), Some(&ScaleError::CaptureEmpty { step: 0 }));
        assert_eq!(p.view().unwrap().index, 0);
        assert!(p.is_adjusting());
    }

    #[test]
    fn progress_is_reported_periodically() {
        let mut p = proc_with(vec![0, 100]);
        let mut s = ScriptedSensor::constant(1);
        p.commit(0).unwrap();
        let mut reports = Vec::new();
        for now in (0..1_000).step_by(50) {
            if let CaptureStatus::Capturing(pr) = p.poll(&mut s, now).unwrap() {
                if pr.report_due {
                    reports.push((now, pr.percent));
                }
            }
        }
        assert_eq!(reports, vec![(500, 50)]);
    }

    #[test]
    fn encoder_target_is_committed_and_nominal_kept() {
        let mut p = proc_with(vec![0, 500]);
        let mut s = ScriptedSensor::constant(100);
        p.commit(0).unwrap();
        let (_, end) = run_window(&mut p, &mut s, 0);

        assert_eq!(p.on_encoder(3, end + 10), Some(503));
        assert_eq!(p.view().unwrap().target_g, 503);
        p.commit(end + 20).unwrap();
        assert_eq!(p.on_encoder(1, end + 30), None);

        let (st, end2) = run_window(&mut p, &mut s, end + 20);
        let CaptureStatus::PointCaptured { point, .. } = st else {
            panic!("expected captured point");
        };
        assert_eq!((point.nominal_g, point.target_g), (500, 503));
        let done = p.poll(&mut s, end2 + 50).unwrap();
        let CaptureStatus::Complete(table) = done else {
            panic!("expected completion");
        };
        assert_eq!(table.len(), 2);
        assert!(p.is_complete());
    }

    #[test]
    fn cancel_returns_to_same_step() {
        let mut p = proc_with(vec![0, 100, 200]);
        let mut s = ScriptedSensor::constant(5);
        p.commit(0).unwrap();
        p.poll(&mut s, 0).unwrap();
        p.cancel_capture().unwrap();
        assert!(p.is_adjusting());
        assert_eq!(p.view().unwrap().index, 0);
        assert!(p.points().is_empty());
        assert!(p.cancel_capture().is_err());
    }

    #[test]
    fn restart_clears_progress() {
        let mut p = proc_with(vec![0, 100]);
        let mut s = ScriptedSensor::constant(5);
        p.on_encoder(7, 0);
        p.commit(10).unwrap();
        run_window(&mut p, &mut s, 10);
        p.restart();
        assert_eq!(p.view().unwrap(), StepView { index: 0, count: 2, nominal_g: 0, target_g: 0 });
        assert!(p.points().is_empty());
    }
}
