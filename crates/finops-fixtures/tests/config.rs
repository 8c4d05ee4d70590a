use std::fs;

use finops_fixtures::config::{load_config, ConfigEnvOverrides, FixtureConfig};

#[test]
fn partial_yaml_fills_defaults() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("fixtures.yaml");
    fs::write(&path, "seed: 7\nresource_count: 12\n").expect("write config");

    let config = load_config(&path).expect("load config");
    assert_eq!(config.seed, Some(7));
    assert_eq!(config.resource_count, 12);
    assert_eq!(config.cost_history_days, 90);
    assert_eq!(config.utilization_days, 30);
    assert_eq!(config.anomaly_count, 5);
    assert_eq!(config.latency_ms, 0);
}

#[test]
fn malformed_yaml_is_invalid_argument() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("broken.yaml");
    fs::write(&path, "resource_count: [not, a, number]\n").expect("write config");

    let err = load_config(&path).expect_err("malformed config should fail");
    assert!(err.to_string().contains("invalid config"), "unexpected error: {err}");
}

#[test]
fn yaml_with_zero_days_fails_validation() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("zero.yaml");
    fs::write(&path, "utilization_days: 0\n").expect("write config");

    let err = load_config(&path).expect_err("zero days should fail");
    assert!(err.to_string().contains("utilization_days"), "unexpected error: {err}");
}

#[test]
fn missing_file_is_io_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let err = load_config(temp.path().join("absent.yaml")).expect_err("missing file");
    assert!(err.to_string().contains("io error"), "unexpected error: {err}");
}

#[test]
fn env_overrides_replace_file_values() {
    let overrides = ConfigEnvOverrides {
        seed: Some("99".to_string()),
        anomaly_count: Some(" 3 ".to_string()),
        latency_ms: Some("25".to_string()),
        ..ConfigEnvOverrides::default()
    };
    let config = FixtureConfig::with_seed(1)
        .apply_env(&overrides)
        .expect("apply overrides");
    assert_eq!(config.seed, Some(99));
    assert_eq!(config.anomaly_count, 3);
    assert_eq!(config.latency_ms, 25);
    assert_eq!(config.resource_count, 50);
}

#[test]
fn non_numeric_override_names_the_variable() {
    let overrides = ConfigEnvOverrides {
        cost_history_days: Some("ninety".to_string()),
        ..ConfigEnvOverrides::default()
    };
    let err = FixtureConfig::default()
        .apply_env(&overrides)
        .expect_err("bad override");
    assert!(
        err.to_string().contains("FINOPS_FIXTURES_COST_DAYS"),
        "unexpected error: {err}"
    );
}
