//! Builder for `ScaleReader`.
//!
//! Every piece except the sensor and the calibration table has a default.
//! `try_build()` validates the configuration before any reading is taken.

use std::sync::Arc;

use scale_traits::{Clock, MonotonicClock, Sensor};

use crate::calibration::{CalibrationTable, WeightConverter};
use crate::config::{FilterCfg, TareCfg, Timeouts};
use crate::error::{BuildError, Report, Result};
use crate::reader::ScaleReader;
use crate::sample_buffer::SampleBuffer;
use crate::tare::TareState;

pub struct ScaleReaderBuilder<S> {
    sensor: Option<S>,
    table: Option<CalibrationTable>,
    filter: Option<FilterCfg>,
    tare: Option<TareCfg>,
    timeouts: Option<Timeouts>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    initial_offset_g: Option<f64>,
}

impl<S> Default for ScaleReaderBuilder<S> {
    fn default() -> Self {
        Self {
            sensor: None,
            table: None,
            filter: None,
            tare: None,
            timeouts: None,
            clock: None,
            initial_offset_g: None,
        }
    }
}

impl<S: Sensor> ScaleReader<S> {
    /// Start building a reader.
    pub fn builder() -> ScaleReaderBuilder<S> {
        ScaleReaderBuilder::default()
    }
}

impl<S: Sensor> ScaleReaderBuilder<S> {
    pub fn with_sensor(mut self, sensor: S) -> Self {
        self.sensor = Some(sensor);
        self
    }
    pub fn with_calibration(mut self, table: CalibrationTable) -> Self {
        self.table = Some(table);
        self
    }
    pub fn with_filter(mut self, filter: FilterCfg) -> Self {
        self.filter = Some(filter);
        self
    }
    pub fn with_tare(mut self, tare: TareCfg) -> Self {
        self.tare = Some(tare);
        self
    }
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = Some(timeouts);
        self
    }
    /// Start from a known tare offset instead of zero.
    pub fn with_tare_offset(mut self, offset_g: f64) -> Self {
        self.initial_offset_g = Some(offset_g);
        self
    }
    /// Provide a custom clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn try_build(self) -> Result<ScaleReader<S>> {
        let sensor = self
            .sensor
            .ok_or_else(|| Report::new(BuildError::MissingSensor))?;
        let table = self
            .table
            .ok_or_else(|| Report::new(BuildError::MissingCalibration))?;
        let filter = self.filter.unwrap_or_default();
        let tare_cfg = self.tare.unwrap_or_default();
        let timeouts = self.timeouts.unwrap_or_default();

        if filter.window == 0 {
            return Err(Report::new(BuildError::InvalidConfig(
                "filter window must be >= 1",
            )));
        }
        if tare_cfg.samples == 0 {
            return Err(Report::new(BuildError::InvalidConfig(
                "tare samples must be >= 1",
            )));
        }
        if timeouts.sensor_ms == 0 {
            return Err(Report::new(BuildError::InvalidConfig(
                "sensor_ms must be >= 1",
            )));
        }
        let mut tare = TareState::new();
        if let Some(off) = self.initial_offset_g {
            if !off.is_finite() {
                return Err(Report::new(BuildError::InvalidConfig(
                    "tare offset must be finite",
                )));
            }
            tare.set(off);
        }

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };

        Ok(ScaleReader {
            sensor,
            buffer: SampleBuffer::new(filter.window),
            converter: WeightConverter::new(&table),
            table,
            tare,
            tare_cfg,
            timeouts,
            clock,
            last_average: None,
        })
    }
}
