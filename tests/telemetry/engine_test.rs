/*!
 * Engine Tests
 * Command policy, shared handles and the tick task
 */

use memtelemetry::telemetry::types::{BackendMode, BlockStatus};
use memtelemetry::{
    CommandPolicy, SeededRandom, SettingsUpdate, TelemetryBackend, TelemetryConfig,
    TelemetryEngine, TelemetryError, TelemetryQuery,
};
use std::time::Duration;

fn engine(policy: CommandPolicy) -> TelemetryEngine {
    let config = TelemetryConfig::default().with_command_policy(policy);
    TelemetryEngine::with_random_source(config, Box::new(SeededRandom::new(21))).unwrap()
}

fn summarize<B: TelemetryBackend>(backend: &B) -> (BackendMode, usize, usize) {
    (
        backend.mode(),
        backend.blocks().len(),
        backend.algorithms().len(),
    )
}

#[test]
fn test_engine_is_a_backend() {
    let engine = engine(CommandPolicy::Interleave);
    assert_eq!(summarize(&engine), (BackendMode::Simulated, 50, 4));
}

#[test]
fn test_blocks_are_stable_between_commands() {
    let engine = engine(CommandPolicy::Interleave);
    let blocks = engine.blocks();
    assert_eq!(blocks.len(), 50);
    assert!(blocks.iter().all(|b| matches!(
        b.status,
        BlockStatus::Active | BlockStatus::Free | BlockStatus::Fragmented
    )));

    engine.tick();
    assert_eq!(engine.blocks(), blocks);
}

#[test]
fn test_synthesized_series_shapes() {
    let engine = engine(CommandPolicy::Interleave);

    let gc = engine.gc_history();
    assert_eq!(gc.len(), 24);
    assert!(gc.windows(2).all(|w| w[0].timestamp < w[1].timestamp));

    assert_eq!(engine.allocation_history().len(), 24);
    assert!(engine
        .cpu_history()
        .iter()
        .all(|p| (5..35).contains(&p.usage_percent)));

    let metrics = engine.performance_metrics();
    assert!((50..150).contains(&metrics.avg_response_time_ms));
    assert!((60..100).contains(&metrics.gc_efficiency));
}

#[test]
fn test_snapshot_matches_queries() {
    let engine = engine(CommandPolicy::Interleave);
    engine.tick();
    let snapshot = engine.snapshot();

    assert_eq!(snapshot.memory_usage, engine.memory_usage());
    assert_eq!(snapshot.fragmentation, engine.fragmentation());
    assert_eq!(snapshot.blocks, engine.blocks());
    assert_eq!(snapshot.memory_history, engine.memory_history());
    assert_eq!(snapshot.settings, engine.settings());

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["mode"], "simulated");
    assert!(json["memoryUsage"]["used"].is_u64());
    assert_eq!(json["blocks"].as_array().map(Vec::len), Some(50));
}

#[tokio::test(start_paused = true)]
async fn test_reject_policy_reports_remaining_time() {
    let engine = engine(CommandPolicy::RejectWhileBusy);
    let pending = engine.defragment_memory().unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    match engine.optimize_memory() {
        Err(TelemetryError::OperationInFlight {
            operation,
            remaining_ms,
        }) => {
            assert_eq!(operation, "optimization");
            assert_eq!(remaining_ms, 500);
        }
        other => panic!("expected rejection, got {:?}", other.map(|_| ())),
    }

    // Settings updates are never blocked
    assert!(engine
        .update_settings(&SettingsUpdate {
            detailed_logging: Some(true),
            ..Default::default()
        })
        .is_ok());

    pending.await;
    assert!(engine.optimize_memory().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_interleaved_commands_apply_in_call_order() {
    let engine = engine(CommandPolicy::Interleave);
    let before = engine.memory_usage().used;

    let collection = engine.run_collection().unwrap();
    let optimization = engine.optimize_memory().unwrap();

    let (collected, optimized) = tokio::join!(collection.wait(), optimization.wait());
    assert_eq!(
        engine.memory_usage().used,
        before - collected.memory_reclaimed_kib - optimized.memory_reclaimed_kib
    );
}

#[tokio::test(start_paused = true)]
async fn test_spawned_engine_ticks_in_background() {
    let config = TelemetryConfig::default().with_seed(8);
    let (engine, task) = TelemetryEngine::spawn(config).unwrap();

    tokio::time::sleep(Duration::from_millis(4_500)).await;
    assert_eq!(engine.memory_history().len(), 2);

    let history = engine.memory_history();
    assert!(history.iter().all(|s| s.used + s.free == 10 * 1024 * 1024));

    task.shutdown().await;
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(engine.memory_history().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_history_caps_at_one_hundred_samples() {
    let (engine, task) = TelemetryEngine::spawn(TelemetryConfig::default().with_seed(4)).unwrap();

    tokio::time::sleep(Duration::from_secs(2 * 130 + 1)).await;
    assert_eq!(engine.memory_history().len(), 100);

    task.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_chart_polling_keeps_seeded_replay() {
    let config = TelemetryConfig::default().with_seed(7);
    let quiet = TelemetryEngine::new(config.clone()).unwrap();
    let polled = TelemetryEngine::new(config).unwrap();

    polled.gc_history();
    polled.allocation_history();
    polled.cpu_history();
    polled.performance_metrics();
    polled.snapshot();

    let (a, b) = tokio::join!(
        quiet.run_collection().unwrap().wait(),
        polled.run_collection().unwrap().wait()
    );
    assert_eq!(a, b);

    let (a, b) = tokio::join!(
        quiet.defragment_memory().unwrap().wait(),
        polled.defragment_memory().unwrap().wait()
    );
    assert_eq!(a, b);
    assert_eq!(quiet.memory_usage(), polled.memory_usage());
}
