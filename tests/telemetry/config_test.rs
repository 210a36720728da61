/*!
 * Configuration Tests
 * Environment overrides; serialized because they mutate process env
 */

use memtelemetry::{CommandPolicy, TelemetryConfig, TelemetryEngine, TelemetryError};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::time::Duration;

const VARS: [&str; 5] = [
    "TELEMETRY_TOTAL_KIB",
    "TELEMETRY_INITIAL_USED_KIB",
    "TELEMETRY_TICK_SECS",
    "TELEMETRY_COMMAND_POLICY",
    "TELEMETRY_SEED",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();
    assert_eq!(TelemetryConfig::from_env().unwrap(), TelemetryConfig::default());
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_env();
    std::env::set_var("TELEMETRY_TOTAL_KIB", "2097152");
    std::env::set_var("TELEMETRY_INITIAL_USED_KIB", "1048576");
    std::env::set_var("TELEMETRY_TICK_SECS", "5");
    std::env::set_var("TELEMETRY_COMMAND_POLICY", "reject");
    std::env::set_var("TELEMETRY_SEED", "42");

    let config = TelemetryConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.total_kib, 2 * 1024 * 1024);
    assert_eq!(config.initial_used_kib, 1024 * 1024);
    assert_eq!(config.tick_interval, Duration::from_secs(5));
    assert_eq!(config.command_policy, CommandPolicy::RejectWhileBusy);
    assert_eq!(config.seed, Some(42));

    let engine = TelemetryEngine::new(config).unwrap();
    assert_eq!(engine.settings().time_interval, 5);
    assert_eq!(engine.memory_usage().free, 1024 * 1024);
}

#[test]
#[serial]
fn test_from_env_rejects_garbage() {
    clear_env();
    std::env::set_var("TELEMETRY_TICK_SECS", "soon");
    let result = TelemetryConfig::from_env();
    clear_env();

    match result {
        Err(TelemetryError::InvalidConfig(msg)) => assert!(msg.contains("TELEMETRY_TICK_SECS")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_from_env_validates_combination() {
    clear_env();
    std::env::set_var("TELEMETRY_TOTAL_KIB", "100000");
    std::env::set_var("TELEMETRY_INITIAL_USED_KIB", "200000");
    let result = TelemetryConfig::from_env();
    clear_env();

    assert!(matches!(result, Err(TelemetryError::InvalidConfig(_))));
}

#[test]
#[serial]
fn test_seeded_engines_replay_identically() {
    clear_env();
    let config = TelemetryConfig::default().with_seed(1234);
    let a = TelemetryEngine::new(config.clone()).unwrap();
    let b = TelemetryEngine::new(config).unwrap();

    for _ in 0..10 {
        a.tick();
        b.tick();
    }
    assert_eq!(a.memory_usage(), b.memory_usage());
    assert_eq!(a.fragmentation(), b.fragmentation());
    assert_eq!(a.blocks(), b.blocks());
}
