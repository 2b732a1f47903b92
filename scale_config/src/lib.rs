#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and calibration file handling for the scale.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The calibration JSON document (`scale.CalibrationPoints`) is parsed
//!   strictly and saved atomically so a torn write never loads.
pub mod atomic;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest target weight the device supports, in grams.
pub const MAX_WEIGHT_G: i32 = 50_000;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SensorCfg {
    /// I2C bus index of the weight unit.
    pub i2c_bus: u8,
    /// 7-bit I2C address of the weight unit.
    pub i2c_address: u16,
    /// Max time to wait for one raw sample before failing (ms).
    pub read_timeout_ms: u64,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            i2c_bus: 1,
            i2c_address: 0x26,
            read_timeout_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilterCfg {
    /// Moving-average window over raw samples.
    pub window: usize,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self { window: 10 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TareCfg {
    /// Readings averaged into one tare offset.
    pub samples: u32,
    /// Pause between tare readings (ms).
    pub interval_ms: u64,
    /// Settle polls before the start-up tare.
    pub settle_polls: u32,
    /// Pause between settle polls (ms).
    pub settle_interval_ms: u64,
}

impl Default for TareCfg {
    fn default() -> Self {
        Self {
            samples: 20,
            interval_ms: 50,
            settle_polls: 10,
            settle_interval_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CaptureCfg {
    /// Nominal calibration weights in grams, in capture order.
    pub points: Vec<i32>,
    /// Length of one timed capture window (ms).
    pub duration_ms: u64,
    /// Minimum spacing between captured samples (ms).
    pub sample_interval_ms: u64,
    /// Spacing between progress reports (ms).
    pub progress_interval_ms: u64,
    /// Fail a capture that collected no samples instead of storing 0.
    pub reject_empty: bool,
}

impl Default for CaptureCfg {
    fn default() -> Self {
        Self {
            points: vec![0, 500, 5_000, 20_000],
            duration_ms: 30_000,
            sample_interval_ms: 100,
            progress_interval_ms: 1_000,
            reject_empty: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EncoderCfg {
    /// Turns closer together than this keep building momentum (ms).
    pub momentum_window_ms: u64,
    pub min_grams: i32,
    pub max_grams: i32,
}

impl Default for EncoderCfg {
    fn default() -> Self {
        Self {
            momentum_window_ms: 500,
            min_grams: 0,
            max_grams: MAX_WEIGHT_G,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Read the sensor inline from the polling loop.
    #[default]
    Direct,
    /// Read the sensor on a background thread.
    Sampler,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunnerCfg {
    pub mode: RunMode,
    /// Live-readout polling period (ms).
    pub poll_interval_ms: u64,
    /// Calibration-wizard polling period (ms).
    pub wizard_poll_ms: u64,
    /// Consecutive failed reads before the loop escalates to a warning.
    pub max_consecutive_failures: u32,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            mode: RunMode::Direct,
            poll_interval_ms: 100,
            wizard_poll_ms: 50,
            max_consecutive_failures: 10,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Where the calibration JSON lives.
    pub path: PathBuf,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            path: PathBuf::from("scale_calibration.json"),
        }
    }
}

/// Parameters of the simulated load cell used when no hardware is compiled in.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulationCfg {
    pub zero_counts: i32,
    pub counts_per_gram: f64,
    pub noise_counts: i32,
    pub load_g: f64,
    /// Fail every n-th read (0 disables).
    pub drop_every: u32,
}

impl Default for SimulationCfg {
    fn default() -> Self {
        Self {
            zero_counts: 8_388,
            counts_per_gram: 10.0,
            noise_counts: 0,
            load_g: 0.0,
            drop_every: 0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub sensor: SensorCfg,
    pub filter: FilterCfg,
    pub tare: TareCfg,
    pub capture: CaptureCfg,
    pub encoder: EncoderCfg,
    pub runner: RunnerCfg,
    pub logging: Logging,
    pub calibration: CalibrationCfg,
    pub simulation: SimulationCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sensor
        if self.sensor.read_timeout_ms == 0 {
            eyre::bail!("sensor.read_timeout_ms must be >= 1");
        }
        if self.sensor.i2c_address > 0x7f {
            eyre::bail!("sensor.i2c_address must be a 7-bit address (<= 0x7f)");
        }

        // Filter
        if self.filter.window == 0 {
            eyre::bail!("filter.window must be >= 1");
        }
        if self.filter.window > 1_000 {
            eyre::bail!("filter.window is unreasonably large (>1000)");
        }

        // Tare
        if self.tare.samples == 0 {
            eyre::bail!("tare.samples must be >= 1");
        }

        // Capture
        if self.capture.points.len() < 2 {
            eyre::bail!(
                "capture.points needs at least 2 weights, got {}",
                self.capture.points.len()
            );
        }
        if let Some(p) = self
            .capture
            .points
            .iter()
            .find(|p| !(0..=MAX_WEIGHT_G).contains(*p))
        {
            eyre::bail!("capture.points entry {p} outside [0, {MAX_WEIGHT_G}] g");
        }
        if self.capture.duration_ms == 0 {
            eyre::bail!("capture.duration_ms must be >= 1");
        }
        if self.capture.duration_ms > 10 * 60 * 1000 {
            eyre::bail!("capture.duration_ms is unreasonably large (>10min)");
        }
        if self.capture.progress_interval_ms == 0 {
            eyre::bail!("capture.progress_interval_ms must be >= 1");
        }

        // Encoder
        if self.encoder.momentum_window_ms == 0 {
            eyre::bail!("encoder.momentum_window_ms must be >= 1");
        }
        if self.encoder.min_grams < 0 || self.encoder.min_grams >= self.encoder.max_grams {
            eyre::bail!("encoder bounds must satisfy 0 <= min_grams < max_grams");
        }
        if self.encoder.max_grams > MAX_WEIGHT_G {
            eyre::bail!("encoder.max_grams must be <= {MAX_WEIGHT_G}");
        }

        // Runner
        if self.runner.poll_interval_ms == 0 {
            eyre::bail!("runner.poll_interval_ms must be >= 1");
        }
        if self.runner.wizard_poll_ms == 0 {
            eyre::bail!("runner.wizard_poll_ms must be >= 1");
        }
        if self.runner.max_consecutive_failures == 0 {
            eyre::bail!("runner.max_consecutive_failures must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref() {
            if !matches!(rot, "never" | "daily" | "hourly") {
                eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
            }
        }

        // Simulation
        if !self.simulation.counts_per_gram.is_finite() || self.simulation.counts_per_gram == 0.0 {
            eyre::bail!("simulation.counts_per_gram must be finite and non-zero");
        }

        Ok(())
    }
}

// ── Calibration file ─────────────────────────────────────────────────────────

/// One persisted calibration point.
///
/// `step` is the index in committed-weight order, `calibration_point` the
/// nominal weight the point was captured for, `weight` the weight actually on
/// the platform when the capture ran.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct CalibrationEntry {
    pub step: u32,
    pub calibration_point: i32,
    pub weight: i32,
    pub adc_average: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ScaleSection {
    #[serde(rename = "CalibrationPoints")]
    pub calibration_points: Vec<CalibrationEntry>,
}

/// The calibration document: `{ "scale": { "CalibrationPoints": [...] } }`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct CalibrationFile {
    pub scale: ScaleSection,
}

impl CalibrationFile {
    pub fn new(entries: Vec<CalibrationEntry>) -> Self {
        Self {
            scale: ScaleSection {
                calibration_points: entries,
            },
        }
    }

    pub fn entries(&self) -> &[CalibrationEntry] {
        &self.scale.calibration_points
    }
}

pub fn parse_calibration_json(s: &str) -> eyre::Result<CalibrationFile> {
    let file: CalibrationFile = serde_json::from_str(s)
        .map_err(|e| eyre::eyre!("calibration JSON is malformed or truncated: {e}"))?;
    if let Some(e) = file.entries().iter().find(|e| !e.adc_average.is_finite()) {
        eyre::bail!("calibration step {} has a non-finite adc_average", e.step);
    }
    Ok(file)
}

/// Read and parse the calibration file. Any syntax error fails closed.
pub fn load_calibration_json(path: &Path) -> eyre::Result<CalibrationFile> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("open calibration file {}: {e}", path.display()))?;
    parse_calibration_json(&text)
        .map_err(|e| eyre::eyre!("calibration file {}: {e}", path.display()))
}

/// Serialize and atomically replace the calibration file.
pub fn save_calibration_json(path: &Path, file: &CalibrationFile) -> eyre::Result<()> {
    let bytes = serde_json::to_vec_pretty(file)
        .map_err(|e| eyre::eyre!("serialize calibration: {e}"))?;
    atomic::write_atomic(path, &bytes)
        .map_err(|e| eyre::eyre!("write calibration file {}: {e}", path.display()))
}
