use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Fast sim-mode config: no smoothing, tiny tare, 1 ms polling.
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[filter]
window = 1

[tare]
samples = 3
interval_ms = 1
settle_polls = 0
settle_interval_ms = 1

[runner]
poll_interval_ms = 1
wizard_poll_ms = 5

[capture]
points = [0, 500]
duration_ms = 200
sample_interval_ms = 10
progress_interval_ms = 100

[simulation]
zero_counts = 8388
counts_per_gram = 10.0
noise_counts = 0
load_g = 0.0
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_calibration(dir: &tempfile::TempDir, points: &[(i32, f64)]) -> PathBuf {
    let entries: Vec<serde_json::Value> = points
        .iter()
        .enumerate()
        .map(|(i, (w, adc))| {
            serde_json::json!({
                "step": i,
                "calibration_point": w,
                "weight": w,
                "adc_average": adc,
            })
        })
        .collect();
    let doc = serde_json::json!({ "scale": { "CalibrationPoints": entries } });
    let path = dir.path().join("calibration.json");
    fs::write(&path, doc.to_string()).unwrap();
    path
}

fn scale_cmd(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("scale").unwrap();
    cmd.env_remove("SCALE_SIM_GRAMS").env_remove("RUST_LOG");
    cmd.arg("--config").arg(cfg);
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["calibrate", "--help"], 0, "load G", "stdout")]
#[case(&["weigh", "--count"], 2, "value is required", "stderr")]
#[case(&["frobnicate"], 2, "unrecognized subcommand", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let assert = scale_cmd(&cfg).args(args).assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn weigh_prints_the_calibrated_weight() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let cal = write_calibration(&dir, &[(0, 8_388.0), (500, 13_388.0)]);

    scale_cmd(&cfg)
        .env("SCALE_SIM_GRAMS", "250")
        .arg("--calibration")
        .arg(&cal)
        .args(["weigh", "--count", "3", "--no-tare"])
        .assert()
        .success()
        .stdout(predicate::str::contains("250 g"))
        .stderr(predicate::str::contains("3 readings, 0 failed"));
}

#[test]
fn startup_tare_zeroes_the_resting_load() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let cal = write_calibration(&dir, &[(0, 8_388.0), (500, 13_388.0)]);

    scale_cmd(&cfg)
        .env("SCALE_SIM_GRAMS", "120")
        .arg("--calibration")
        .arg(&cal)
        .args(["weigh", "--count", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 g"))
        .stdout(predicate::str::contains("120 g").not());
}

#[test]
fn tare_prints_the_offset() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let cal = write_calibration(&dir, &[(0, 8_388.0), (500, 13_388.0)]);

    scale_cmd(&cfg)
        .env("SCALE_SIM_GRAMS", "40")
        .arg("--calibration")
        .arg(&cal)
        .arg("tare")
        .assert()
        .success()
        .stdout(predicate::str::contains("tare offset: 40.0 g"));
}

#[test]
fn missing_calibration_file_is_a_persistence_failure() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    scale_cmd(&cfg)
        .arg("--calibration")
        .arg(dir.path().join("nope.json"))
        .args(["weigh", "--count", "1"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("What happened"))
        .stderr(predicate::str::contains("loading"));
}

#[test]
fn single_point_calibration_is_rejected() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let cal = write_calibration(&dir, &[(0, 8_388.0)]);

    scale_cmd(&cfg)
        .arg("--calibration")
        .arg(&cal)
        .args(["weigh", "--count", "1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("at least 2"));
}

#[test]
fn truncated_calibration_file_fails_closed() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let cal = dir.path().join("calibration.json");
    fs::write(&cal, r#"{"scale":{"CalibrationPoints":[{"step":0,"#).unwrap();

    scale_cmd(&cfg)
        .arg("--calibration")
        .arg(&cal)
        .arg("tare")
        .assert()
        .code(7);
}

#[rstest]
#[case("[filter]\nwindow = 0\n", "filter.window")]
#[case("[capture]\npoints = [500]\n", "capture.points")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
#[case("this is not toml", "parse config")]
fn invalid_config_exits_with_config_code(#[case] toml: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("bad.toml");
    fs::write(&cfg, toml).unwrap();

    scale_cmd(&cfg)
        .arg("self-check")
        .assert()
        .code(8)
        .stderr(predicate::str::contains(needle));
}

#[test]
fn self_check_reports_each_subsystem() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let cal = write_calibration(&dir, &[(0, 8_388.0), (500, 13_388.0), (5_000, 58_388.0)]);

    scale_cmd(&cfg)
        .arg("--calibration")
        .arg(&cal)
        .arg("self-check")
        .assert()
        .success()
        .stdout(predicate::str::contains("sensor"))
        .stdout(predicate::str::contains("raw 8388"))
        .stdout(predicate::str::contains("3 points, 0..5000 g"));
}

#[test]
fn self_check_fails_without_calibration() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    scale_cmd(&cfg)
        .arg("--calibration")
        .arg(dir.path().join("missing.json"))
        .arg("self-check")
        .assert()
        .code(7)
        .stdout(predicate::str::contains("FAILED"));
}

#[test]
fn calibration_point_beyond_adjustable_range_is_a_config_error() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    scale_cmd(&cfg)
        .args(["calibrate", "--points", "0,60000", "--dry-run"])
        .assert()
        .code(8)
        .stderr(predicate::str::contains("outside adjustable range"));
}
