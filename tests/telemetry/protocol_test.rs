/*!
 * Protocol Tests
 * JSON commands dispatched against a live engine
 */

use memtelemetry::{
    dispatch, CommandPolicy, CommandRunner, SeededRandom, ServerReply, TelemetryConfig,
    TelemetryEngine,
};
use std::time::Duration;
use tokio::time::Instant;

fn engine(policy: CommandPolicy) -> TelemetryEngine {
    let config = TelemetryConfig::default().with_command_policy(policy);
    TelemetryEngine::with_random_source(config, Box::new(SeededRandom::new(77))).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_run_gc_reply_waits_for_duration() {
    let engine = engine(CommandPolicy::Interleave);
    let start = Instant::now();

    match dispatch(&engine, r#"{"command":"runGc"}"#).await {
        ServerReply::Collection(outcome) => {
            assert!(outcome.success);
            assert_eq!(start.elapsed(), Duration::from_millis(outcome.duration_ms));
        }
        other => panic!("unexpected reply {:?}", other),
    }
    assert_eq!(engine.gc_stats().runs_today, 1);
}

#[tokio::test(start_paused = true)]
async fn test_defragment_reply() {
    let engine = engine(CommandPolicy::Interleave);
    let start = Instant::now();

    let reply = dispatch(&engine, r#"{"command":"defragmentMemory"}"#).await;
    assert_eq!(start.elapsed(), Duration::from_millis(800));

    let json: serde_json::Value = serde_json::from_str(&reply.to_json().unwrap()).unwrap();
    assert_eq!(json["type"], "defragmentation");
    assert_eq!(json["fragmentationReduced"], 15);
}

#[tokio::test]
async fn test_update_settings_reply() {
    let engine = engine(CommandPolicy::Interleave);
    let reply = dispatch(
        &engine,
        r#"{"command":"updateSettings","settings":{"memoryThreshold":60,"enableNotifications":false}}"#,
    )
    .await;

    match reply {
        ServerReply::Settings(settings) => {
            assert_eq!(settings.memory_threshold, 60);
            assert!(!settings.enable_notifications);
        }
        other => panic!("unexpected reply {:?}", other),
    }
    assert_eq!(engine.settings().memory_threshold, 60);
}

#[tokio::test]
async fn test_invalid_setting_reply() {
    let engine = engine(CommandPolicy::Interleave);
    let reply = dispatch(
        &engine,
        r#"{"command":"updateSettings","settings":{"cpuLimit":250}}"#,
    )
    .await;

    match reply {
        ServerReply::Error(err) => assert_eq!(err.error_type, "invalid_setting"),
        other => panic!("unexpected reply {:?}", other),
    }
    assert_eq!(engine.settings().cpu_limit, 20);
}

#[tokio::test]
async fn test_malformed_message_reply() {
    let engine = engine(CommandPolicy::Interleave);
    for raw in ["not json", r#"{"command":"shutdownEverything"}"#, r#"{"settings":{}}"#] {
        match dispatch(&engine, raw).await {
            ServerReply::Error(err) => assert_eq!(err.error_type, "malformed_command"),
            other => panic!("unexpected reply to {}: {:?}", raw, other),
        }
    }
}

#[tokio::test]
async fn test_snapshot_reply() {
    let engine = engine(CommandPolicy::Interleave);
    match dispatch(&engine, r#"{"command":"snapshot"}"#).await {
        ServerReply::Snapshot(snapshot) => {
            assert_eq!(snapshot.memory_usage, engine.memory_usage());
            assert_eq!(snapshot.algorithms.len(), 4);
        }
        other => panic!("unexpected reply {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_busy_engine_rejects_over_protocol() {
    let engine = engine(CommandPolicy::RejectWhileBusy);
    let _pending = engine.optimize_memory().unwrap();

    match dispatch(&engine, r#"{"command":"runGc"}"#).await {
        ServerReply::Error(err) => assert_eq!(err.error_type, "operation_in_flight"),
        other => panic!("unexpected reply {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_runner_replies_in_completion_order() {
    let mut runner = CommandRunner::new(engine(CommandPolicy::Interleave));
    runner.submit(r#"{"command":"defragmentMemory"}"#.to_string());
    runner.submit(r#"{"command":"optimizeMemory"}"#.to_string());
    assert_eq!(runner.pending(), 2);

    assert!(matches!(runner.next_reply().await, Some(ServerReply::Optimization(_))));
    assert!(matches!(runner.next_reply().await, Some(ServerReply::Defragmentation(_))));
    assert!(runner.next_reply().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_drain_delivers_replies_within_grace() {
    let engine = engine(CommandPolicy::Interleave);
    let mut runner = CommandRunner::new(engine.clone());
    runner.submit(r#"{"command":"defragmentMemory"}"#.to_string());

    let (replies, abandoned) = runner.drain(Duration::from_secs(1)).await;
    assert_eq!(abandoned, 0);
    assert_eq!(replies.len(), 1);
    assert!(matches!(replies[0], ServerReply::Defragmentation(_)));
    assert_eq!(runner.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_drain_reports_commands_past_grace() {
    let mut runner = CommandRunner::new(engine(CommandPolicy::Interleave));
    runner.submit(r#"{"command":"defragmentMemory"}"#.to_string());
    runner.submit(r#"{"command":"snapshot"}"#.to_string());

    let (replies, abandoned) = runner.drain(Duration::from_millis(100)).await;
    assert_eq!(replies.len(), 1);
    assert!(matches!(replies[0], ServerReply::Snapshot(_)));
    assert_eq!(abandoned, 1);
    assert_eq!(runner.pending(), 0);
}
