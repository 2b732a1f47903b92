//! A sensor that never answers: each command fails with its own exit code,
//! except the live readout, which counts failures and keeps going.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_dead_sensor_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[filter]
window = 1

[tare]
samples = 3
interval_ms = 1
settle_polls = 0

[runner]
poll_interval_ms = 1
wizard_poll_ms = 2
max_consecutive_failures = 2

[capture]
duration_ms = 40
sample_interval_ms = 5
progress_interval_ms = 20
reject_empty = true

[simulation]
drop_every = 1
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_calibration(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("calibration.json");
    fs::write(
        &path,
        r#"{"scale":{"CalibrationPoints":[
            {"step":0,"calibration_point":0,"weight":0,"adc_average":8388.0},
            {"step":1,"calibration_point":500,"weight":500,"adc_average":13388.0}
        ]}}"#,
    )
    .unwrap();
    path
}

#[rstest]
#[case::tare(&["tare"], 5, "Tare failed")]
#[case::self_check(&["self-check"], 4, "did not deliver a sample")]
fn dead_sensor_exit_codes(#[case] args: &[&str], #[case] code: i32, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_dead_sensor_config(&dir);
    let cal = write_calibration(&dir);

    Command::cargo_bin("scale")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("--calibration")
        .arg(&cal)
        .args(args)
        .assert()
        .code(code)
        .stderr(predicate::str::contains(needle));
}

#[test]
fn live_readout_survives_a_dead_sensor() {
    let dir = tempdir().unwrap();
    let cfg = write_dead_sensor_config(&dir);
    let cal = write_calibration(&dir);

    Command::cargo_bin("scale")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("--calibration")
        .arg(&cal)
        .args(["weigh", "--count", "5"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("warning: tare capture failed"))
        .stderr(predicate::str::contains("0 readings, 5 failed"));
}

#[test]
fn empty_capture_with_closed_input_ends_in_state_error() {
    let dir = tempdir().unwrap();
    let cfg = write_dead_sensor_config(&dir);

    assert_cmd::Command::cargo_bin("scale")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["calibrate", "--dry-run"])
        .write_stdin("c\n")
        .assert()
        .code(9)
        .stderr(predicate::str::contains("input ended early"));
}
