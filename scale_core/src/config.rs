//! Configuration types for the measurement engine.
//!
//! These are the runtime configuration structs used by `ScaleReader`,
//! `MomentumController` and `CalibrationProcedure`. They are separate from
//! the TOML-deserialized config in `scale_config`.

/// Smoothing window over raw samples.
#[derive(Debug, Clone)]
pub struct FilterCfg {
    /// Moving-average window size (1 = no smoothing).
    pub window: usize,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self { window: 10 }
    }
}

/// Tare capture parameters.
#[derive(Debug, Clone)]
pub struct TareCfg {
    /// Readings averaged into one offset.
    pub samples: u32,
    /// Pause between readings (ms).
    pub interval_ms: u64,
}

impl Default for TareCfg {
    fn default() -> Self {
        Self {
            samples: 20,
            interval_ms: 50,
        }
    }
}

/// Timed calibration capture parameters.
#[derive(Debug, Clone)]
pub struct CaptureCfg {
    /// Nominal weights in grams, one step each, in capture order.
    pub points: Vec<i32>,
    /// Capture window per step (ms).
    pub duration_ms: u64,
    /// Minimum spacing between samples inside the window (ms). 0 samples every poll.
    pub sample_interval_ms: u64,
    /// Spacing between progress reports (ms).
    pub progress_interval_ms: u64,
    /// Fail an empty capture instead of recording an average of 0.
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

/// Rotary-encoder momentum parameters.
#[derive(Debug, Clone)]
pub struct MomentumCfg {
    /// Same-direction turns closer than this build momentum (ms).
    pub window_ms: u64,
    /// Lower clamp for adjusted targets (grams).
    pub min_g: i32,
    /// Upper clamp for adjusted targets (grams).
    pub max_g: i32,
}

impl Default for MomentumCfg {
    fn default() -> Self {
        Self {
            window_ms: 500,
            min_g: 0,
            max_g: 50_000,
        }
    }
}

/// Live polling loop parameters.
#[derive(Debug, Clone)]
pub struct LiveCfg {
    /// Pause between reads (ms).
    pub poll_interval_ms: u64,
    /// Consecutive failed reads before the loop escalates to a warning.
    pub max_consecutive_failures: u32,
    /// Stop after this many poll cycles; `None` runs until shut down.
    pub max_reads: Option<u64>,
}

impl Default for LiveCfg {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            max_consecutive_failures: 10,
            max_reads: None,
        }
    }
}

/// Timeouts and watchdogs.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Max sensor wait per read (ms).
    pub sensor_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { sensor_ms: 100 }
    }
}
