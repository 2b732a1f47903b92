use rstest::rstest;
use scale_config::{RunMode, load_toml};

#[test]
fn empty_config_uses_device_defaults() {
    let cfg = load_toml("").expect("parse TOML");
    cfg.validate().expect("defaults should validate");
    assert_eq!(cfg.filter.window, 10);
    assert_eq!(cfg.tare.samples, 20);
    assert_eq!(cfg.capture.points, vec![0, 500, 5_000, 20_000]);
    assert_eq!(cfg.capture.duration_ms, 30_000);
    assert_eq!(cfg.encoder.momentum_window_ms, 500);
    assert_eq!(cfg.encoder.max_grams, 50_000);
    assert_eq!(cfg.runner.mode, RunMode::Direct);
}

#[test]
fn parses_full_config() {
    let toml = r#"
[sensor]
i2c_bus = 0
i2c_address = 0x26
read_timeout_ms = 50

[filter]
window = 5

[tare]
samples = 8
interval_ms = 10

[capture]
points = [0, 1000]
duration_ms = 2000
sample_interval_ms = 20
progress_interval_ms = 500
reject_empty = true

[encoder]
momentum_window_ms = 400
max_grams = 30000

[runner]
mode = "sampler"
poll_interval_ms = 20

[logging]
level = "debug"
rotation = "daily"

[calibration]
path = "/flash/scale_calibration.json"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.sensor.i2c_bus, 0);
    assert_eq!(cfg.filter.window, 5);
    assert_eq!(cfg.capture.points, vec![0, 1000]);
    assert!(cfg.capture.reject_empty);
    assert_eq!(cfg.runner.mode, RunMode::Sampler);
    assert_eq!(
        cfg.calibration.path,
        std::path::PathBuf::from("/flash/scale_calibration.json")
    );
}

#[rstest]
#[case("[filter]\nwindow = 0", "filter.window must be >= 1")]
#[case("[tare]\nsamples = 0", "tare.samples must be >= 1")]
#[case("[capture]\npoints = [0]", "capture.points needs at least 2")]
#[case("[capture]\npoints = [0, 60000]", "outside [0, 50000]")]
#[case("[capture]\nduration_ms = 0", "capture.duration_ms must be >= 1")]
#[case("[encoder]\nmin_grams = 100\nmax_grams = 100", "encoder bounds")]
#[case("[sensor]\nread_timeout_ms = 0", "sensor.read_timeout_ms must be >= 1")]
#[case("[runner]\nmax_consecutive_failures = 0", "max_consecutive_failures")]
#[case("[logging]\nrotation = \"weekly\"", "logging.rotation")]
fn rejects_out_of_range_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "expected {needle:?} in {err}"
    );
}

#[test]
fn unknown_run_mode_is_a_parse_error() {
    assert!(load_toml("[runner]\nmode = \"turbo\"").is_err());
}

#[test]
fn shipped_sample_config_validates() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../etc/scale_config.toml");
    let text = std::fs::read_to_string(&path).expect("read sample config");
    let cfg = load_toml(&text).expect("parse sample config");
    cfg.validate().expect("sample config should validate");
    assert_eq!(cfg.sensor.i2c_address, 0x26);
    assert_eq!(cfg.simulation.noise_counts, 3);
}
