//! Sensor assembly: real I2C weight unit or the simulated load cell.

use std::time::Duration;

use scale_config::{Config, RunMode};
use scale_core::Sampler;
use scale_hardware::SimLoad;
use scale_traits::{MonotonicClock, Sensor};

/// Environment override for the simulated load (grams).
pub const SIM_GRAMS_ENV: &str = "SCALE_SIM_GRAMS";

pub type DynSensor = Box<dyn Sensor + Send>;

pub struct Backend {
    pub sensor: DynSensor,
    /// Handle to the simulated platform load; `None` on real hardware.
    pub sim_load: Option<SimLoad>,
}

/// Open the sensor selected at build time and apply `[runner].mode`.
pub fn open_backend(cfg: &Config) -> eyre::Result<Backend> {
    let backend = open_sensor(cfg)?;
    let sensor = match cfg.runner.mode {
        RunMode::Direct => backend.sensor,
        RunMode::Sampler => {
            tracing::debug!(period_ms = cfg.runner.poll_interval_ms, "reading sensor on a background thread");
            Box::new(Sampler::spawn(
                backend.sensor,
                Duration::from_millis(cfg.runner.poll_interval_ms.max(1)),
                Duration::from_millis(cfg.sensor.read_timeout_ms),
                MonotonicClock::new(),
            ))
        }
    };
    Ok(Backend {
        sensor,
        sim_load: backend.sim_load,
    })
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_sensor(cfg: &Config) -> eyre::Result<Backend> {
    let dev = scale_hardware::weight_i2c::WeightI2c::new(cfg.sensor.i2c_bus, cfg.sensor.i2c_address)
        .map_err(|e| {
            eyre::eyre!(
                "open i2c weight unit on bus {} at {:#04x}: {e}",
                cfg.sensor.i2c_bus,
                cfg.sensor.i2c_address
            )
        })?;
    tracing::info!(bus = cfg.sensor.i2c_bus, address = cfg.sensor.i2c_address, "i2c weight unit ready");
    Ok(Backend {
        sensor: Box::new(dev),
        sim_load: None,
    })
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn open_sensor(cfg: &Config) -> eyre::Result<Backend> {
    let sim = &cfg.simulation;
    let grams = match std::env::var(SIM_GRAMS_ENV) {
        Ok(v) => v
            .trim()
            .parse::<f64>()
            .map_err(|e| eyre::eyre!("{SIM_GRAMS_ENV}={v:?} is not a number: {e}"))?,
        Err(_) => sim.load_g,
    };
    let load = SimLoad::new(grams);
    let sensor = scale_hardware::SimulatedSensor::new()
        .with_load(load.clone())
        .with_response(sim.zero_counts, sim.counts_per_gram)
        .with_noise(sim.noise_counts, 0x5ca1e)
        .with_dropouts(sim.drop_every);
    tracing::info!(load_g = grams, "using simulated load cell");
    Ok(Backend {
        sensor: Box::new(sensor),
        sim_load: Some(load),
    })
}
