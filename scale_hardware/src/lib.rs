//! Sensor backends: a simulated load cell and (feature `hardware`) the
//! M5Stack Unit Weight-I2C.
pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod weight_i2c;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scale_traits::{BoxError, Sensor};
use std::sync::{Arc, Mutex};

use crate::error::HwError;

/// Shared handle to the load currently sitting on a [`SimulatedSensor`].
///
/// Cloning the handle lets a test or the CLI move weight on and off the
/// platform while the sensor is owned elsewhere (e.g. by a sampler thread).
#[derive(Debug, Clone, Default)]
pub struct SimLoad(Arc<Mutex<f64>>);

impl SimLoad {
    pub fn new(grams: f64) -> Self {
        Self(Arc::new(Mutex::new(grams)))
    }

    pub fn set(&self, grams: f64) {
        if let Ok(mut g) = self.0.lock() {
            *g = grams;
        }
    }

    pub fn get(&self) -> f64 {
        self.0.lock().map(|g| *g).unwrap_or(0.0)
    }
}

/// Simulated load cell with a linear response:
/// `raw = zero_counts + counts_per_gram * grams + noise`.
pub struct SimulatedSensor {
    load: SimLoad,
    zero_counts: i32,
    counts_per_gram: f64,
    noise_counts: i32,
    /// Fail every n-th read (0 disables), to exercise transient error paths.
    drop_every: u32,
    reads: u32,
    rng: StdRng,
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self {
            load: SimLoad::default(),
            zero_counts: 8_388,
            counts_per_gram: 1.0,
            noise_counts: 0,
            drop_every: 0,
            reads: 0,
            rng: StdRng::seed_from_u64(0x5ca1e),
        }
    }

    pub fn with_load(mut self, load: SimLoad) -> Self {
        self.load = load;
        self
    }

    pub fn with_response(mut self, zero_counts: i32, counts_per_gram: f64) -> Self {
        self.zero_counts = zero_counts;
        self.counts_per_gram = counts_per_gram;
        self
    }

    /// Uniform noise in `[-amplitude, amplitude]` counts, from a seeded RNG.
    pub fn with_noise(mut self, amplitude: i32, seed: u64) -> Self {
        self.noise_counts = amplitude.abs();
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_dropouts(mut self, every: u32) -> Self {
        self.drop_every = every;
        self
    }

    pub fn load(&self) -> SimLoad {
        self.load.clone()
    }
}

impl Sensor for SimulatedSensor {
    fn read(&mut self, _timeout: std::time::Duration) -> Result<i32, BoxError> {
        self.reads = self.reads.wrapping_add(1);
        if self.drop_every > 0 && self.reads % self.drop_every == 0 {
            tracing::trace!(read = self.reads, "simulated dropout");
            return Err(Box::new(HwError::Dropout));
        }
        let noise = if self.noise_counts > 0 {
            self.rng.gen_range(-self.noise_counts..=self.noise_counts)
        } else {
            0
        };
        let ideal = f64::from(self.zero_counts) + self.counts_per_gram * self.load.get();
        let raw = ideal.round() as i32 + noise;
        tracing::trace!(raw, "simulated sample");
        Ok(raw)
    }
}
