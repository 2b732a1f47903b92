use thiserror::Error;

/// Why a raw sample could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorFault {
    /// No data within the read timeout.
    Timeout,
    /// Bus-level failure talking to the ADC.
    Bus(String),
    /// Anything else reported by the sensor backend.
    Other(String),
}

impl core::fmt::Display for SensorFault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SensorFault::Timeout => f.write_str("timeout"),
            SensorFault::Bus(s) => write!(f, "bus: {s}"),
            SensorFault::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScaleError {
    #[error("insufficient calibration data: need at least 2 points, found {found}")]
    InsufficientCalibrationData { found: usize },
    #[error("sample unavailable: {0}")]
    SampleUnavailable(SensorFault),
    #[error("tare capture failed: no valid reading in {attempts} attempts")]
    TareCaptureFailed { attempts: u32 },
    #[error("calibration capture for step {step} collected no samples")]
    CaptureEmpty { step: usize },
    #[error("persistence failure while {stage} calibration: {reason}")]
    PersistenceFailure { stage: &'static str, reason: String },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
}

impl ScaleError {
    /// Short status text for a small display line (at most 16 characters).
    pub fn status_line(&self) -> &'static str {
        match self {
            ScaleError::InsufficientCalibrationData { .. } => "No calibration",
            ScaleError::SampleUnavailable(_) => "Sensor error",
            ScaleError::TareCaptureFailed { .. } => "Tare error",
            ScaleError::CaptureEmpty { .. } => "No samples",
            ScaleError::PersistenceFailure { .. } => "Save error",
            ScaleError::Config(_) => "Config error",
            ScaleError::State(_) => "Busy",
        }
    }

    /// Transient errors are skipped by polling loops; everything else ends the session.
    pub fn is_transient(&self) -> bool {
        matches!(self, ScaleError::SampleUnavailable(_))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing sensor")]
    MissingSensor,
    #[error("missing calibration table")]
    MissingCalibration,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

/// Find the typed scale error inside a report, if there is one.
pub fn scale_error(report: &Report) -> Option<&ScaleError> {
    report.downcast_ref::<ScaleError>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lines_fit_a_small_display() {
        let all = [
            ScaleError::InsufficientCalibrationData { found: 1 },
            ScaleError::SampleUnavailable(SensorFault::Timeout),
            ScaleError::TareCaptureFailed { attempts: 20 },
            ScaleError::CaptureEmpty { step: 2 },
            ScaleError::PersistenceFailure {
                stage: "saving",
                reason: "disk full".into(),
            },
            ScaleError::Config("x".into()),
            ScaleError::State("y".into()),
        ];
        for e in all {
            assert!(e.status_line().len() <= 16, "{e:?}");
        }
    }

    #[test]
    fn only_sample_errors_are_transient() {
        assert!(ScaleError::SampleUnavailable(SensorFault::Timeout).is_transient());
        assert!(!ScaleError::TareCaptureFailed { attempts: 1 }.is_transient());
    }

    #[test]
    fn typed_error_survives_report_wrapping() {
        let r = Report::new(ScaleError::InsufficientCalibrationData { found: 1 });
        assert_eq!(
            scale_error(&r),
            Some(&ScaleError::InsufficientCalibrationData { found: 1 })
        );
    }
}
