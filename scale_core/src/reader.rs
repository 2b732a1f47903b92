//! Live weight readout: sensor → smoothing window → calibration → tare.

use std::sync::Arc;
use std::time::Duration;

use scale_traits::{Clock, Sensor};

use crate::calibration::{CalibrationTable, WeightConverter};
use crate::config::{TareCfg, Timeouts};
use crate::error::{Report, Result, ScaleError};
use crate::hw_error::map_sensor_error;
use crate::sample_buffer::SampleBuffer;
use crate::tare::TareState;

/// One measurement session over a single sensor.
///
/// Owns the smoothing window, the active calibration and the tare offset.
/// Build with [`ScaleReader::builder`].
pub struct ScaleReader<S: Sensor> {
    pub(crate) sensor: S,
    pub(crate) buffer: SampleBuffer,
    pub(crate) table: CalibrationTable,
    pub(crate) converter: WeightConverter,
    pub(crate) tare: TareState,
    pub(crate) tare_cfg: TareCfg,
    pub(crate) timeouts: Timeouts,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) last_average: Option<f64>,
}

impl<S: Sensor> core::fmt::Debug for ScaleReader<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScaleReader")
            .field("window", &self.buffer.capacity())
            .field("buffered", &self.buffer.len())
            .field("points", &self.table.len())
            .field("tare_offset_g", &self.tare.offset())
            .field("last_average", &self.last_average)
            .finish()
    }
}

impl<S: Sensor> ScaleReader<S> {
    /// Read one sample and return the tared weight in grams.
    ///
    /// On a sensor failure nothing is pushed and `SampleUnavailable` is
    /// returned; the caller decides whether to retry.
    pub fn read(&mut self) -> Result<f64> {
        let timeout = Duration::from_millis(self.timeouts.sensor_ms);
        let raw = self
            .sensor
            .read(timeout)
            .map_err(|e| Report::new(map_sensor_error(e.as_ref())))?;
        tracing::trace!(raw, "adc sample");

        self.buffer.push(raw);
        let avg = self.buffer.average().unwrap_or_else(|| f64::from(raw));
        self.last_average = Some(avg);
        let weight = self.tare.apply(self.converter.convert(avg));
        tracing::debug!(avg, weight, "weight");
        Ok(weight)
    }

    /// Capture a new tare offset from the current load.
    ///
    /// Takes `tare.samples` readings spaced by `tare.interval_ms`. Each one is
    /// converted back to its untared value before averaging, so repeated tares
    /// over the same load give the same offset. Returns the new offset.
    pub fn tare(&mut self) -> Result<f64> {
        let attempts = self.tare_cfg.samples.max(1);
        let interval = Duration::from_millis(self.tare_cfg.interval_ms);
        let mut sum = 0.0;
        let mut ok = 0u32;

        for i in 0..attempts {
            match self.read() {
                Ok(w) => {
                    sum += self.tare.remove(w);
                    ok += 1;
                }
                Err(e) => tracing::debug!(attempt = i, error = %e, "tare sample failed"),
            }
            if i + 1 < attempts {
                self.clock.sleep(interval);
            }
        }

        if ok == 0 {
            tracing::warn!(attempts, "tare failed, keeping previous offset");
            return Err(Report::new(ScaleError::TareCaptureFailed { attempts }));
        }
        let offset = sum / f64::from(ok);
        self.tare.set(offset);
        tracing::info!(offset_g = offset, samples = ok, attempts, "tare captured");
        Ok(offset)
    }

    pub fn tare_offset(&self) -> f64 {
        self.tare.offset()
    }

    /// Smoothed ADC value behind the most recent successful read.
    pub fn last_average(&self) -> Option<f64> {
        self.last_average
    }

    pub fn converter(&self) -> &WeightConverter {
        &self.converter
    }

    pub fn calibration(&self) -> &CalibrationTable {
        &self.table
    }

    /// Install a new calibration; the smoothing window restarts empty.
    pub fn replace_calibration(&mut self, table: CalibrationTable) {
        self.converter = WeightConverter::new(&table);
        self.table = table;
        self.buffer.clear();
        self.last_average = None;
        tracing::info!(points = self.table.len(), "calibration replaced");
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }
}
