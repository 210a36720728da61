/*!
 * Settings Tests
 * Partial merges and domain validation through the engine
 */

use memtelemetry::telemetry::settings::CollectionPriority;
use memtelemetry::{SeededRandom, Settings, SettingsUpdate, TelemetryConfig, TelemetryEngine, TelemetryError};
use pretty_assertions::assert_eq;

fn engine() -> TelemetryEngine {
    TelemetryEngine::with_random_source(TelemetryConfig::default(), Box::new(SeededRandom::new(1)))
        .unwrap()
}

#[test]
fn test_default_settings() {
    let settings = engine().settings();
    assert_eq!(settings, Settings::with_time_interval(2));
    assert!(settings.auto_collection);
    assert_eq!(settings.memory_threshold, 75);
    assert_eq!(settings.cpu_limit, 20);
    assert_eq!(settings.default_algorithm, 2);
    assert_eq!(settings.collection_priority, CollectionPriority::Balanced);
}

#[test]
fn test_threshold_update_merges_single_field() {
    let engine = engine();
    let before = engine.settings();

    let merged = engine
        .update_settings(&SettingsUpdate {
            memory_threshold: Some(50),
            ..Default::default()
        })
        .unwrap();

    let expected = Settings {
        memory_threshold: 50,
        ..before
    };
    assert_eq!(merged, expected);
    assert_eq!(engine.settings(), expected);
}

#[test]
fn test_update_from_ui_json() {
    let engine = engine();
    let update: SettingsUpdate = serde_json::from_str(
        r#"{"collectionPriority":"memory","memoryCompaction":true,"defaultAlgorithm":4}"#,
    )
    .unwrap();

    let merged = engine.update_settings(&update).unwrap();
    assert_eq!(merged.collection_priority, CollectionPriority::Memory);
    assert!(merged.memory_compaction);
    assert_eq!(merged.default_algorithm, 4);
    assert_eq!(merged.memory_threshold, 75);
}

#[test]
fn test_empty_update_changes_nothing() {
    let engine = engine();
    let before = engine.settings();
    let update = SettingsUpdate::default();
    assert!(update.is_empty());
    assert_eq!(engine.update_settings(&update).unwrap(), before);
}

#[test]
fn test_out_of_domain_fields_are_rejected() {
    let engine = engine();
    let before = engine.settings();

    let cases = [
        (
            SettingsUpdate {
                memory_threshold: Some(101),
                ..Default::default()
            },
            "memoryThreshold",
        ),
        (
            SettingsUpdate {
                time_interval: Some(0),
                ..Default::default()
            },
            "timeInterval",
        ),
        (
            SettingsUpdate {
                cpu_limit: Some(0),
                ..Default::default()
            },
            "cpuLimit",
        ),
        (
            SettingsUpdate {
                default_algorithm: Some(9),
                ..Default::default()
            },
            "defaultAlgorithm",
        ),
    ];

    for (update, expected_field) in cases {
        match engine.update_settings(&update) {
            Err(TelemetryError::InvalidSetting { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected rejection of {}, got {:?}", expected_field, other),
        }
    }
    assert_eq!(engine.settings(), before);
}

#[test]
fn test_disabling_auto_collection_stops_ticks_collecting() {
    let config = TelemetryConfig::default().with_initial_used_kib(9 * 1024 * 1024);
    let engine =
        TelemetryEngine::with_random_source(config, Box::new(SeededRandom::new(2))).unwrap();

    engine
        .update_settings(&SettingsUpdate {
            auto_collection: Some(false),
            ..Default::default()
        })
        .unwrap();

    for _ in 0..5 {
        let report = engine.tick();
        assert!(!report.collection_due);
        assert!(report.auto_collection.is_none());
    }
    assert_eq!(engine.gc_stats().runs_today, 0);
}
