//! `From` implementations bridging `scale_config` types to `scale_core` types.

use crate::calibration::{CalibrationPoint, CalibrationTable};
use crate::config::{CaptureCfg, FilterCfg, LiveCfg, MomentumCfg, TareCfg, Timeouts};
use crate::error::Result;

// ── Runtime config ───────────────────────────────────────────────────────────

impl From<&scale_config::FilterCfg> for FilterCfg {
    fn from(c: &scale_config::FilterCfg) -> Self {
        Self { window: c.window }
    }
}

impl From<&scale_config::TareCfg> for TareCfg {
    fn from(c: &scale_config::TareCfg) -> Self {
        Self {
            samples: c.samples,
            interval_ms: c.interval_ms,
        }
    }
}

impl From<&scale_config::CaptureCfg> for CaptureCfg {
    fn from(c: &scale_config::CaptureCfg) -> Self {
        Self {
            points: c.points.clone(),
            duration_ms: c.duration_ms,
            sample_interval_ms: c.sample_interval_ms,
            progress_interval_ms: c.progress_interval_ms,
            reject_empty: c.reject_empty,
        }
    }
}

impl From<&scale_config::EncoderCfg> for MomentumCfg {
    fn from(c: &scale_config::EncoderCfg) -> Self {
        Self {
            window_ms: c.momentum_window_ms,
            min_g: c.min_grams,
            max_g: c.max_grams,
        }
    }
}

impl From<&scale_config::RunnerCfg> for LiveCfg {
    fn from(c: &scale_config::RunnerCfg) -> Self {
        Self {
            poll_interval_ms: c.poll_interval_ms,
            max_consecutive_failures: c.max_consecutive_failures,
            max_reads: None,
        }
    }
}

impl From<&scale_config::SensorCfg> for Timeouts {
    fn from(c: &scale_config::SensorCfg) -> Self {
        Self {
            sensor_ms: c.read_timeout_ms,
        }
    }
}

// ── Calibration file ─────────────────────────────────────────────────────────

impl From<&scale_config::CalibrationEntry> for CalibrationPoint {
    fn from(e: &scale_config::CalibrationEntry) -> Self {
        Self {
            ordinal: e.step as usize,
            nominal_g: e.calibration_point,
            target_g: e.weight,
            adc_average: e.adc_average,
            samples: 0,
        }
    }
}

/// Entries are written in ascending weight order; `step` is the position in that order.
impl From<&CalibrationTable> for scale_config::CalibrationFile {
    fn from(t: &CalibrationTable) -> Self {
        let entries = t
            .storage_order()
            .iter()
            .enumerate()
            .map(|(i, p)| scale_config::CalibrationEntry {
                step: u32::try_from(i).unwrap_or(u32::MAX),
                calibration_point: p.nominal_g,
                weight: p.target_g,
                adc_average: p.adc_average,
            })
            .collect();
        Self::new(entries)
    }
}

impl TryFrom<&scale_config::CalibrationFile> for CalibrationTable {
    type Error = eyre::Report;

    fn try_from(f: &scale_config::CalibrationFile) -> Result<Self> {
        CalibrationTable::new(f.entries().iter().map(CalibrationPoint::from).collect())
    }
}
