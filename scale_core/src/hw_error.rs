//! Maps `Box<dyn Error>` from the `Sensor` boundary to a typed `ScaleError`.
//!
//! The traits in `scale_traits` use `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to `ScaleError::SampleUnavailable`,
//! with an optional feature-gated path for `scale_hardware::HwError` downcasting.

use crate::error::{ScaleError, SensorFault};

/// Map a sensor read error to a typed `ScaleError`.
///
/// Attempts to downcast known error types first, then falls back to
/// string-based heuristics. Every sensor failure is a transient
/// `SampleUnavailable`; only the fault detail differs.
pub fn map_sensor_error(e: &(dyn std::error::Error + 'static)) -> ScaleError {
    if let Some(se) = e.downcast_ref::<ScaleError>() {
        return se.clone();
    }

    #[cfg(feature = "hardware-errors")]
    {
        use scale_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            let fault = match hw {
                HwError::Timeout => SensorFault::Timeout,
                HwError::I2c(s) => SensorFault::Bus(s.clone()),
                other => SensorFault::Other(other.to_string()),
            };
            return ScaleError::SampleUnavailable(fault);
        }
    }

    let s = e.to_string();
    let fault = if s.to_lowercase().contains("timeout") {
        SensorFault::Timeout
    } else {
        SensorFault::Other(s)
    };
    ScaleError::SampleUnavailable(fault)
}
