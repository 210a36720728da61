/*!
 * Scenario Tests
 * Deterministic command sequences driven by scripted random draws
 */

use memtelemetry::core::limits::{DEFAULT_INITIAL_USED_KIB, DEFAULT_TOTAL_KIB};
use memtelemetry::telemetry::types::FragmentationLevel;
use memtelemetry::{ScriptedRandom, SeededRandom, TelemetryConfig, TelemetryEngine};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::time::Instant;

fn engine_with(rng: ScriptedRandom) -> TelemetryEngine {
    TelemetryEngine::with_random_source(TelemetryConfig::default(), Box::new(rng))
        .expect("default config is valid")
}

#[tokio::test(start_paused = true)]
async fn test_collection_with_fixed_draws() {
    // duration, reclaim, objects, cpu, algorithm index
    let engine = engine_with(ScriptedRandom::new().with_ints([300, 1024, 5000, 10, 0]));
    let start = Instant::now();

    let pending = engine.run_collection().expect("collection accepted");

    // State changes before the result is released
    let usage = engine.memory_usage();
    assert_eq!(usage.total, DEFAULT_TOTAL_KIB);
    assert_eq!(usage.used, DEFAULT_INITIAL_USED_KIB - 1024);
    assert_eq!(usage.free, usage.total - usage.used);

    let stats = engine.gc_stats();
    assert_eq!(stats.runs_today, 1);
    assert_eq!(stats.avg_duration_ms, 300.0);
    assert!(stats.last_run.is_some());

    let activities = engine.recent_activities();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].duration_ms, 300);
    assert_eq!(activities[0].memory_reclaimed_kib, 1024);
    assert_eq!(activities[0].objects_collected, 5000);
    assert_eq!(activities[0].cpu_impact_percent, 10);
    assert_eq!(activities[0].algorithm, "Mark-Sweep");

    let outcome = pending.await;
    assert_eq!(start.elapsed(), Duration::from_millis(300));
    assert!(outcome.success);
    assert_eq!(outcome.duration_ms, 300);
    assert_eq!(outcome.memory_reclaimed_kib, 1024);
    assert_eq!(outcome.objects_collected, 5000);
}

#[tokio::test(start_paused = true)]
async fn test_defragmentation_crosses_into_low_then_floors() {
    let engine = engine_with(ScriptedRandom::new());
    let start = engine.fragmentation();
    assert_eq!(start.percentage(), 18.0);
    assert_eq!(start.level(), FragmentationLevel::Medium);

    let first = engine.defragment_memory().unwrap();
    assert_eq!(engine.fragmentation().percentage(), 3.0);
    assert_eq!(engine.fragmentation().level(), FragmentationLevel::Low);

    let second = engine.defragment_memory().unwrap();
    let third = engine.defragment_memory().unwrap();
    assert_eq!(engine.fragmentation().percentage(), 0.0);
    assert_eq!(engine.fragmentation().level(), FragmentationLevel::Low);

    for pending in [first, second, third] {
        let outcome = pending.await;
        assert!(outcome.success);
        assert_eq!(outcome.fragmentation_reduced, 15);
    }
}

#[tokio::test(start_paused = true)]
async fn test_collection_never_drives_usage_negative() {
    let config = TelemetryConfig::default().with_initial_used_kib(100);
    let rng = ScriptedRandom::new().with_ints([200, 400 * 1024, 2000, 5, 1]);
    let engine = TelemetryEngine::with_random_source(config, Box::new(rng)).unwrap();

    let outcome = engine.run_collection().unwrap().await;
    assert_eq!(engine.memory_usage().used, 0);
    assert_eq!(engine.memory_usage().free, engine.memory_usage().total);
    assert_eq!(outcome.memory_reclaimed_kib, 100);
}

#[tokio::test(start_paused = true)]
async fn test_optimization_releases_after_half_second() {
    let engine = engine_with(ScriptedRandom::new().with_ints([4096]));
    let start = Instant::now();

    let pending = engine.optimize_memory().unwrap();
    assert_eq!(engine.memory_usage().used, DEFAULT_INITIAL_USED_KIB - 4096);
    assert_eq!(engine.gc_stats().runs_today, 0);

    let outcome = pending.await;
    assert_eq!(start.elapsed(), Duration::from_millis(500));
    assert_eq!(outcome.memory_reclaimed_kib, 4096);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_handle_keeps_mutation() {
    let engine = TelemetryEngine::with_random_source(
        TelemetryConfig::default(),
        Box::new(SeededRandom::new(3)),
    )
    .unwrap();

    drop(engine.run_collection().unwrap());
    assert_eq!(engine.gc_stats().runs_today, 1);
    assert_eq!(engine.recent_activities().len(), 1);
}
