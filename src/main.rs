/*!
 * Memory Telemetry - Main Entry Point
 *
 * Demo driver for the simulated backend:
 * - Ticks the engine at the configured cadence
 * - Logs a summary snapshot periodically
 * - Reads JSON commands from stdin, one per line, and prints the replies
 */

use anyhow::Context;
use memtelemetry::{init_tracing, CommandRunner, ServerReply, TelemetryConfig, TelemetryEngine};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

const SUMMARY_INTERVAL: Duration = Duration::from_secs(5);
/// Longest command delay is a collection (600 ms)
const REPLY_GRACE: Duration = Duration::from_secs(1);

fn print_reply(reply: &ServerReply) {
    match reply.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => error!(error = %e, "Failed to encode reply"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Memory telemetry starting...");

    let config = TelemetryConfig::from_env().context("loading TELEMETRY_* configuration")?;
    info!(
        total_kib = config.total_kib,
        tick_secs = config.tick_interval.as_secs(),
        policy = ?config.command_policy,
        "Configuration loaded"
    );

    let (engine, task) = TelemetryEngine::spawn(config)?;

    info!("Engine running in {:?} mode", engine.mode());
    info!("Send JSON commands on stdin, e.g. {{\"command\":\"runGc\"}}");
    info!("Press Ctrl+C to exit");

    let mut summary = tokio::time::interval(SUMMARY_INTERVAL);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut commands = CommandRunner::new(engine.clone());

    loop {
        tokio::select! {
            _ = summary.tick() => {
                let snapshot = engine.snapshot();
                info!(
                    used_kib = snapshot.memory_usage.used,
                    usage_pct = format!("{:.1}", snapshot.memory_usage.usage_percentage()),
                    fragmentation = %snapshot.fragmentation.level(),
                    cpu_impact = format!("{:.2}", snapshot.cpu_impact),
                    gc_runs = snapshot.gc_stats.runs_today,
                    "Telemetry summary"
                );
            }

            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(raw)) if raw.trim().is_empty() => {}
                    Ok(Some(raw)) => commands.submit(raw),
                    Ok(None) => {
                        info!("stdin closed, continuing without command input");
                        stdin_open = false;
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to read command");
                        stdin_open = false;
                    }
                }
            }

            Some(reply) = commands.next_reply(), if commands.pending() > 0 => {
                print_reply(&reply);
            }

            result = tokio::signal::ctrl_c() => {
                result.context("listening for Ctrl+C")?;
                info!("Shutdown requested");
                break;
            }
        }
    }

    let (replies, abandoned) = commands.drain(REPLY_GRACE).await;
    for reply in &replies {
        print_reply(reply);
    }
    if abandoned > 0 {
        warn!(abandoned, "Commands dropped without a reply");
    }

    task.shutdown().await;
    info!("Memory telemetry stopped");
    Ok(())
}
