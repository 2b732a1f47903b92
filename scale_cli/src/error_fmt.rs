//! Human-readable error descriptions and structured JSON error formatting.

use scale_core::error::{BuildError, ScaleError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSensor => {
                "What happened: No sensor was provided to the scale reader.\nLikely causes: The sensor backend failed to initialize.\nHow to fix: Check the [sensor] section and the I2C wiring, then rerun `scale self-check`.".to_string()
            }
            BuildError::MissingCalibration => {
                "What happened: No calibration table was provided.\nLikely causes: The calibration file was not loaded.\nHow to fix: Run `scale calibrate` to create one.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<ScaleError>() {
        return match se {
            ScaleError::InsufficientCalibrationData { found } => format!(
                "What happened: The calibration has {found} point(s); at least 2 are needed.\nLikely causes: An interrupted or hand-edited calibration file.\nHow to fix: Run `scale calibrate` to capture a full table."
            ),
            ScaleError::SampleUnavailable(fault) => format!(
                "What happened: The load cell did not deliver a sample ({fault}).\nLikely causes: Loose I2C cable, wrong bus/address, or a read timeout set too low.\nHow to fix: Check the wiring and [sensor] settings; consider raising sensor.read_timeout_ms."
            ),
            ScaleError::TareCaptureFailed { attempts } => format!(
                "What happened: Tare failed; none of {attempts} readings succeeded.\nLikely causes: The sensor is not responding.\nHow to fix: Check the sensor connection and retry. The previous zero is still in effect."
            ),
            ScaleError::CaptureEmpty { step } => format!(
                "What happened: Calibration step {} collected no samples.\nLikely causes: The sensor stopped responding during the capture.\nHow to fix: Check the sensor, then commit the step again.",
                step + 1
            ),
            ScaleError::PersistenceFailure { stage, reason } => format!(
                "What happened: Failed while {stage} the calibration file ({reason}).\nLikely causes: Missing, truncated or unwritable file.\nHow to fix: Check [calibration].path and its permissions; rerun `scale calibrate` if the file is damaged."
            ),
            ScaleError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
            ScaleError::State(msg) => format!(
                "What happened: {msg}.\nLikely causes: The operation was interrupted or input ended early.\nHow to fix: Start the command again."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("parse config") || lower.contains("invalid configuration") {
        return format!(
            "What happened: Configuration is invalid.\nLikely causes: A TOML syntax error or an out-of-range value.\nHow to fix: Edit the config file and try again. Details: {msg}"
        );
    }

    if lower.contains("i2c") {
        return format!(
            "What happened: Failed to open the I2C sensor.\nLikely causes: Wrong bus number, I2C disabled, or insufficient permissions.\nHow to fix: Check [sensor].i2c_bus and i2c_address and enable I2C. Details: {msg}"
        );
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable name for the error kind, used in JSON output.
pub fn error_kind(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    match err.downcast_ref::<ScaleError>() {
        Some(ScaleError::InsufficientCalibrationData { .. }) => "InsufficientCalibrationData",
        Some(ScaleError::SampleUnavailable(_)) => "SampleUnavailable",
        Some(ScaleError::TareCaptureFailed { .. }) => "TareCaptureFailed",
        Some(ScaleError::CaptureEmpty { .. }) => "CaptureEmpty",
        Some(ScaleError::PersistenceFailure { .. }) => "PersistenceFailure",
        Some(ScaleError::Config(_)) => "Config",
        Some(ScaleError::State(_)) => "State",
        None => "Error",
    }
}

/// Map error kinds to stable exit codes; anything untyped returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match error_kind(err) {
        "InsufficientCalibrationData" => 3,
        "SampleUnavailable" => 4,
        "TareCaptureFailed" => 5,
        "CaptureEmpty" => 6,
        "PersistenceFailure" => 7,
        "Config" => 8,
        "State" => 9,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let mut obj = json!({
        "reason": error_kind(err),
        "message": humanize(err),
    });
    if let Some(se) = err.downcast_ref::<ScaleError>() {
        obj["status"] = json!(se.status_line());
    }
    obj.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scale_core::error::SensorFault;

    #[test]
    fn typed_errors_get_their_own_exit_codes() {
        let cases = [
            (ScaleError::InsufficientCalibrationData { found: 1 }, 3),
            (ScaleError::SampleUnavailable(SensorFault::Timeout), 4),
            (ScaleError::PersistenceFailure { stage: "loading", reason: "x".into() }, 7),
            (ScaleError::State("interrupted".into()), 9),
        ];
        for (e, code) in cases {
            assert_eq!(exit_code_for_error(&eyre::Report::new(e)), code);
        }
        assert_eq!(exit_code_for_error(&eyre::eyre!("plain")), 1);
    }

    #[test]
    fn json_error_carries_kind_and_status() {
        let r = eyre::Report::new(ScaleError::TareCaptureFailed { attempts: 20 });
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&r)).unwrap();
        assert_eq!(v["reason"], "TareCaptureFailed");
        assert_eq!(v["status"], "Tare error");
        assert!(v["message"].as_str().unwrap().starts_with("What happened"));
    }
}
