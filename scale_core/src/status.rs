//! Status values returned from each calibration procedure poll.

use crate::calibration::{CalibrationPoint, CalibrationTable};

/// What the operator should see while choosing a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepView {
    /// Zero-based step index.
    pub index: usize,
    pub count: usize,
    pub nominal_g: i32,
    /// Target as adjusted with the encoder so far.
    pub target_g: i32,
}

/// Snapshot of a running timed capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureProgress {
    pub step: usize,
    pub elapsed_ms: u64,
    pub duration_ms: u64,
    pub samples: u32,
    pub failures: u32,
    /// Elapsed share of the window, clamped to 100.
    pub percent: u8,
    /// Set on the poll where a periodic progress report is due.
    pub report_due: bool,
}

impl CaptureProgress {
    pub fn elapsed_s(&self) -> u64 {
        self.elapsed_ms / 1_000
    }

    pub fn total_s(&self) -> u64 {
        self.duration_ms / 1_000
    }
}

/// Public status of one poll of the calibration procedure.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureStatus {
    /// Waiting for the operator to adjust and commit.
    Adjusting(StepView),
    /// Timed capture in progress.
    Capturing(CaptureProgress),
    /// A step finished on this poll.
    PointCaptured {
        point: CalibrationPoint,
        failures: u32,
    },
    /// Every step is captured; the table is ready to persist.
    Complete(CalibrationTable),
}
