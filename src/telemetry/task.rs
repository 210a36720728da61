/*!
 * Tick Task
 * Background task driving the engine's periodic tick
 *
 * The first tick fires one full period after spawn. The period follows the
 * engine's cadence channel, so a `time_interval` settings change restarts the
 * interval at the new rate. Missed ticks are skipped rather than replayed.
 *
 * # Shutdown
 *
 * Prefer `shutdown().await`, which lets the loop exit and waits for it. A
 * handle dropped without it aborts the task and logs a warning.
 */

use super::engine::TelemetryEngine;
use log::{info, trace, warn};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Control messages for the tick task
#[derive(Debug, Clone)]
pub enum TickCommand {
    /// Stop ticking; commands and queries keep working
    Pause,
    Resume,
    /// Tick now, outside the schedule
    Trigger,
    Shutdown,
}

/// Handle to the tick background task
pub struct TickTask {
    command_tx: mpsc::UnboundedSender<TickCommand>,
    handle: Option<tokio::task::JoinHandle<()>>,
    shutdown_initiated: bool,
}

impl TickTask {
    /// Spawn the tick loop for `engine`; must be called inside a tokio runtime
    pub fn spawn(engine: TelemetryEngine) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let cadence = engine.cadence();

        let handle = tokio::spawn(async move {
            run_tick_loop(engine, cadence, command_rx).await;
        });

        info!("Tick task spawned");

        Self {
            command_tx,
            handle: Some(handle),
            shutdown_initiated: false,
        }
    }

    pub fn pause(&self) {
        let _ = self.command_tx.send(TickCommand::Pause);
    }

    pub fn resume(&self) {
        let _ = self.command_tx.send(TickCommand::Resume);
    }

    /// Run one tick immediately, even while paused
    pub fn trigger(&self) {
        let _ = self.command_tx.send(TickCommand::Trigger);
    }

    /// Stop the loop and wait for it to exit
    pub async fn shutdown(mut self) {
        self.shutdown_initiated = true;
        let _ = self.command_tx.send(TickCommand::Shutdown);

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Tick task shutdown error: {}", e);
            } else {
                info!("Tick task shutdown complete");
            }
        }
    }
}

fn schedule(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn run_tick_loop(
    engine: TelemetryEngine,
    mut cadence: watch::Receiver<Duration>,
    mut command_rx: mpsc::UnboundedReceiver<TickCommand>,
) {
    let mut active = true;
    let period = *cadence.borrow_and_update();
    let mut interval = schedule(period);

    info!("Tick loop started with {:?} cadence", period);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if active {
                    let report = engine.tick();
                    trace!(
                        "Tick: {:.1}% used, auto-collection: {}",
                        report.usage.usage_percentage(),
                        report.auto_collection.is_some()
                    );
                }
            }

            Ok(()) = cadence.changed() => {
                let period = *cadence.borrow_and_update();
                info!("Tick cadence now {:?}", period);
                interval = schedule(period);
            }

            Some(cmd) = command_rx.recv() => {
                match cmd {
                    TickCommand::Pause => {
                        info!("Tick task paused");
                        active = false;
                    }
                    TickCommand::Resume => {
                        info!("Tick task resumed");
                        active = true;
                    }
                    TickCommand::Trigger => {
                        engine.tick();
                        trace!("Manual tick");
                    }
                    TickCommand::Shutdown => {
                        info!("Tick task shutting down");
                        break;
                    }
                }
            }
        }
    }
}

impl Drop for TickTask {
    fn drop(&mut self) {
        if self.shutdown_initiated {
            return;
        }

        if let Some(handle) = self.handle.take() {
            warn!(
                "TickTask dropped without calling shutdown() - aborting task. \
                 Use `task.shutdown().await` for graceful cleanup."
            );
            handle.abort();
        }
    }
}
