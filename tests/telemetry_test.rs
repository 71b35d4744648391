//! Integration tests for telemetry initialization.

use envcfg::telemetry::{TelemetryConfig, init_telemetry};

#[test]
fn telemetry_initializes_once() {
    // The global subscriber can only be set once per process; a second
    // attempt must fail instead of panicking.
    let _ = init_telemetry(TelemetryConfig::default());
    let second = init_telemetry(TelemetryConfig {
        default_level: "debug".to_string(),
        json: true,
    });
    assert!(second.is_err());
}

#[test]
fn invalid_default_level_is_rejected() {
    // The configured level only applies when RUST_LOG is unset.
    unsafe {
        std::env::remove_var("RUST_LOG");
    }
    let result = init_telemetry(TelemetryConfig {
        default_level: "envcfg=loudest".to_string(),
        json: false,
    });
    assert!(result.is_err());
}
