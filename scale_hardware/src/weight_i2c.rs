use std::time::{Duration, Instant};
use tracing::trace;

use rppal::i2c::I2c;
use scale_traits::{BoxError, Sensor};

use crate::error::{HwError, Result};

/// Default 7-bit address of the M5Stack Unit Weight-I2C.
pub const DEFAULT_ADDRESS: u16 = 0x26;
/// Register holding the signed 32-bit raw ADC value (little endian).
const RAW_ADC_REG: u8 = 0x00;

/// Driver for the M5Stack Unit Weight-I2C (HX711 behind an STM32 bridge).
pub struct WeightI2c {
    bus: I2c,
    retry_interval: Duration,
}

impl WeightI2c {
    pub fn new(bus_index: u8, address: u16) -> Result<Self> {
        let mut bus = I2c::with_bus(bus_index).map_err(|e| HwError::I2c(e.to_string()))?;
        bus.set_slave_address(address)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        Ok(Self {
            bus,
            retry_interval: Duration::from_millis(2),
        })
    }

    fn read_raw_once(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.bus
            .write_read(&[RAW_ADC_REG], &mut buf)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Read the raw ADC register, retrying bus errors until `timeout` expires.
    pub fn read_with_timeout(&mut self, timeout: Duration) -> Result<i32> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.read_raw_once() {
                Ok(raw) => {
                    trace!(raw, "weight unit raw read");
                    return Ok(raw);
                }
                Err(e) if Instant::now() < deadline => {
                    trace!(error = %e, "weight unit read failed, retrying");
                    std::thread::sleep(self.retry_interval);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "weight unit read gave up");
                    return Err(HwError::Timeout);
                }
            }
        }
    }
}

impl Sensor for WeightI2c {
    fn read(&mut self, timeout: Duration) -> std::result::Result<i32, BoxError> {
        self.read_with_timeout(timeout).map_err(Into::into)
    }
}
