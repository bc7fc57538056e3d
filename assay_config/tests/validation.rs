use assay_config::{Config, load_toml};
use rstest::rstest;

#[test]
fn empty_document_uses_defaults() {
    let cfg = load_toml("").expect("parse TOML");
    cfg.validate().expect("defaults must validate");

    assert_eq!(cfg.scan.min_latency_ms, 2000);
    assert_eq!(cfg.scan.max_latency_ms, 3000);
    assert_eq!(cfg.connect.max_latency_ms, 3500);
    assert!((cfg.connect.failure_probability - 0.10).abs() < 1e-9);
    assert_eq!(cfg.detect.min_latency_ms, 1500);
    assert_eq!(cfg.stream.interval_ms, 200);
    assert!(cfg.catalog.is_empty());
    assert_eq!(cfg.effective_catalog().len(), 2);
}

#[test]
fn full_document_parses() {
    let toml = r#"
[scan]
min_latency_ms = 10
max_latency_ms = 20
failure_probability = 0.0

[connect]
min_latency_ms = 5
max_latency_ms = 15
failure_probability = 0.25

[detect]
min_latency_ms = 1
max_latency_ms = 2

[stream]
interval_ms = 50

[[catalog]]
id = "rdr-1"
name = "Bench Reader"
serial = "BR-0001"
firmware = "v1.0.0"
medium = "nfc"
battery_min = 10
battery_max = 90
signal_min = 50
signal_max = 100
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("validate");

    assert_eq!(cfg.connect.min_latency_ms, 5);
    assert!((cfg.connect.failure_probability - 0.25).abs() < 1e-9);
    assert_eq!(cfg.catalog.len(), 1);
    assert_eq!(cfg.catalog[0].id, "rdr-1");
    assert_eq!(cfg.effective_catalog().len(), 1);
}

#[test]
fn rejects_inverted_latency_window() {
    let toml = r#"
[connect]
min_latency_ms = 500
max_latency_ms = 100
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("inverted window must fail");
    assert!(format!("{err}").contains("min_latency_ms must be <= max_latency_ms"));
}

#[rstest]
#[case(-0.1)]
#[case(1.5)]
fn rejects_out_of_range_probability(#[case] p: f64) {
    let toml = format!(
        r#"
[connect]
failure_probability = {p}
"#
    );
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("probability must fail");
    assert!(format!("{err}").contains("failure_probability must be in [0.0, 1.0]"));
}

#[test]
fn rejects_zero_stream_interval() {
    let toml = r#"
[stream]
interval_ms = 0
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject interval_ms=0");
    assert!(format!("{err}").contains("stream.interval_ms must be >= 1"));
}

#[test]
fn rejects_battery_bounds_above_100() {
    let toml = r#"
[[catalog]]
id = "rdr-1"
name = "Bench Reader"
serial = "BR-0001"
firmware = "v1.0.0"
battery_min = 90
battery_max = 120
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("battery bounds must fail");
    assert!(format!("{err}").contains("battery bounds"));
}

#[test]
fn rejects_duplicate_catalog_ids() {
    let toml = r#"
[[catalog]]
id = "rdr-1"
name = "A"
serial = "S1"
firmware = "v1"

[[catalog]]
id = "rdr-1"
name = "B"
serial = "S2"
firmware = "v1"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("duplicate ids must fail");
    assert!(format!("{err}").contains("duplicate device id"));
}

#[test]
fn validate_passes_defaulted_sections() {
    let cfg = Config::default();
    cfg.validate().expect("default config must validate");
}
