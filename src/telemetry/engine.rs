/*!
 * Telemetry Engine
 *
 * Cloneable, thread-safe handle around one `TelemetryState`. Every clone
 * drives the same state; there is no global instance.
 *
 * ## Ordering
 *
 * Ticks and commands take the state lock and run to completion, so each
 * mutation is observed whole. A command returns a `Deferred` whose outcome is
 * released after the simulated duration (collection: its drawn duration,
 * optimization: 500ms, defragmentation: 800ms). A command issued before an
 * earlier result is released already sees the earlier mutation.
 *
 * Overlap is governed by `CommandPolicy`: `Interleave` lets every command
 * apply, `RejectWhileBusy` fails commands until the latest deadline passes and
 * skips tick-triggered collections in that window.
 */

use super::deferred::Deferred;
use super::settings::{Settings, SettingsUpdate};
use super::state::{TelemetryState, TickReport};
use super::task::TickTask;
use super::traits::{TelemetryCommands, TelemetryQuery};
use super::types::*;
use crate::core::config::{CommandPolicy, TelemetryConfig};
use crate::core::errors::{TelemetryError, TelemetryResult};
use crate::core::limits::{DEFRAGMENT_DELAY, OPTIMIZE_DELAY};
use crate::core::random::RandomSource;
use crate::monitoring::OperationSpan;
use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

struct EngineInner {
    state: TelemetryState,
    /// Latest pending notification deadline
    busy_until: Option<Instant>,
}

impl EngineInner {
    fn admit(&self, operation: &str, policy: CommandPolicy) -> TelemetryResult<()> {
        if policy != CommandPolicy::RejectWhileBusy {
            return Ok(());
        }
        match self.remaining_busy() {
            Some(remaining) => Err(TelemetryError::OperationInFlight {
                operation: operation.to_string(),
                remaining_ms: remaining.as_millis() as u64,
            }),
            None => Ok(()),
        }
    }

    fn remaining_busy(&self) -> Option<Duration> {
        let until = self.busy_until?;
        let now = Instant::now();
        (until > now).then(|| until - now)
    }

    fn mark_busy(&mut self, delay: Duration) {
        let until = Instant::now() + delay;
        self.busy_until = Some(match self.busy_until {
            Some(current) => current.max(until),
            None => until,
        });
    }
}

/// Simulated telemetry backend
#[derive(Clone)]
pub struct TelemetryEngine {
    inner: Arc<Mutex<EngineInner>>,
    policy: CommandPolicy,
    /// Tick cadence, republished whenever `time_interval` changes
    cadence: Arc<watch::Sender<Duration>>,
}

impl TelemetryEngine {
    /// Engine with the config's random source
    pub fn new(config: TelemetryConfig) -> TelemetryResult<Self> {
        let rng = config.random_source();
        Self::with_random_source(config, rng)
    }

    /// Engine drawing ticks and commands from a caller-supplied source
    pub fn with_random_source(
        config: TelemetryConfig,
        rng: Box<dyn RandomSource>,
    ) -> TelemetryResult<Self> {
        let chart_rng = config.chart_random_source();
        Self::with_random_sources(config, rng, chart_rng)
    }

    /// Engine with separate sources for commands and for blocks and charts
    pub fn with_random_sources(
        config: TelemetryConfig,
        rng: Box<dyn RandomSource>,
        chart_rng: Box<dyn RandomSource>,
    ) -> TelemetryResult<Self> {
        config.validate()?;
        let (cadence, _) = watch::channel(config.tick_interval);
        info!(
            "Telemetry engine ready (policy: {:?}, simulated backend)",
            config.command_policy
        );
        Ok(Self {
            inner: Arc::new(Mutex::new(EngineInner {
                state: TelemetryState::with_sources(&config, rng, chart_rng),
                busy_until: None,
            })),
            policy: config.command_policy,
            cadence: Arc::new(cadence),
        })
    }

    /// Construct and start ticking; must be called inside a tokio runtime
    pub fn spawn(config: TelemetryConfig) -> TelemetryResult<(Self, TickTask)> {
        let engine = Self::new(config)?;
        let task = engine.start_ticking();
        Ok((engine, task))
    }

    /// Spawn the periodic tick task for this engine
    pub fn start_ticking(&self) -> TickTask {
        TickTask::spawn(self.clone())
    }

    pub fn policy(&self) -> CommandPolicy {
        self.policy
    }

    /// Receiver observing the tick cadence
    pub fn cadence(&self) -> watch::Receiver<Duration> {
        self.cadence.subscribe()
    }

    /// Time until the latest pending command result is released
    pub fn busy_for(&self) -> Option<Duration> {
        self.inner.lock().remaining_busy()
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// One tick: perturb metrics, record a sample, auto-collect when due
    pub fn tick(&self) -> TickReport {
        let mut inner = self.inner.lock();
        let mut report = inner.state.advance();

        if report.collection_due {
            if self.policy == CommandPolicy::RejectWhileBusy && inner.remaining_busy().is_some() {
                debug!("Auto-collection due but a command is in flight, skipping");
            } else {
                info!(
                    "Auto-collection triggered at {:.1}% usage (threshold {}%)",
                    report.usage.usage_percentage(),
                    inner.state.settings().memory_threshold
                );
                let outcome = inner.state.collect();
                inner.mark_busy(Duration::from_millis(outcome.duration_ms));
                report.usage = inner.state.memory_usage();
                report.fragmentation = inner.state.fragmentation();
                report.auto_collection = Some(outcome);
            }
        }

        report
    }

    // =========================================================================
    // Commands
    // =========================================================================

    pub fn run_collection(&self) -> TelemetryResult<Deferred<CollectionOutcome>> {
        let span = OperationSpan::new("gc_collection");
        let mut inner = self.inner.lock();
        if let Err(e) = inner.admit("collection", self.policy) {
            span.record_error(&e.to_string());
            return Err(e);
        }

        let outcome = inner.state.collect();
        let delay = Duration::from_millis(outcome.duration_ms);
        inner.mark_busy(delay);
        span.record_reclaimed(outcome.memory_reclaimed_kib);

        Ok(Deferred::new(outcome, delay))
    }

    pub fn optimize_memory(&self) -> TelemetryResult<Deferred<OptimizationOutcome>> {
        let span = OperationSpan::new("optimize");
        let mut inner = self.inner.lock();
        if let Err(e) = inner.admit("optimization", self.policy) {
            span.record_error(&e.to_string());
            return Err(e);
        }

        let outcome = inner.state.optimize();
        inner.mark_busy(OPTIMIZE_DELAY);
        span.record_reclaimed(outcome.memory_reclaimed_kib);

        Ok(Deferred::new(outcome, OPTIMIZE_DELAY))
    }

    pub fn defragment_memory(&self) -> TelemetryResult<Deferred<DefragmentationOutcome>> {
        let span = OperationSpan::new("defragment");
        let mut inner = self.inner.lock();
        if let Err(e) = inner.admit("defragmentation", self.policy) {
            span.record_error(&e.to_string());
            return Err(e);
        }

        let outcome = inner.state.defragment();
        inner.mark_busy(DEFRAGMENT_DELAY);
        span.record_reclaimed(outcome.memory_reclaimed_kib);

        Ok(Deferred::new(outcome, DEFRAGMENT_DELAY))
    }

    /// Validate and merge a partial update
    ///
    /// An update naming `time_interval` republishes the cadence so a running
    /// tick task restarts its interval at the new rate. Publishing happens
    /// under the state lock, so the cadence always matches the stored settings.
    pub fn update_settings(&self, update: &SettingsUpdate) -> TelemetryResult<Settings> {
        let mut inner = self.inner.lock();
        let merged = inner.state.update_settings(update)?;

        if update.time_interval.is_some() {
            let cadence = Duration::from_secs(merged.time_interval);
            if *self.cadence.borrow() != cadence {
                info!("Tick cadence changed to {}s", merged.time_interval);
                self.cadence.send_replace(cadence);
            }
        }

        Ok(merged)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn mode(&self) -> BackendMode {
        BackendMode::Simulated
    }

    pub fn memory_usage(&self) -> MemoryUsage {
        self.inner.lock().state.memory_usage()
    }

    pub fn gc_stats(&self) -> GcStats {
        self.inner.lock().state.gc_stats()
    }

    pub fn cpu_impact(&self) -> f64 {
        self.inner.lock().state.cpu_impact()
    }

    pub fn fragmentation(&self) -> FragmentationStatus {
        self.inner.lock().state.fragmentation()
    }

    pub fn recent_activities(&self) -> Vec<Activity> {
        self.inner.lock().state.recent_activities()
    }

    pub fn recent_activities_up_to(&self, limit: usize) -> Vec<Activity> {
        self.inner.lock().state.recent_activities_up_to(limit)
    }

    pub fn blocks(&self) -> Vec<MemoryBlock> {
        self.inner.lock().state.blocks().to_vec()
    }

    pub fn algorithms(&self) -> Vec<Algorithm> {
        self.inner.lock().state.algorithms().to_vec()
    }

    pub fn algorithm(&self, id: u32) -> Option<Algorithm> {
        self.inner.lock().state.algorithm(id).cloned()
    }

    pub fn settings(&self) -> Settings {
        self.inner.lock().state.settings().clone()
    }

    pub fn memory_history(&self) -> Vec<MemorySample> {
        self.inner.lock().state.memory_history()
    }

    pub fn gc_history(&self) -> Vec<GcHistoryPoint> {
        self.inner.lock().state.gc_history()
    }

    pub fn allocation_history(&self) -> Vec<AllocationPoint> {
        self.inner.lock().state.allocation_history()
    }

    pub fn cpu_history(&self) -> Vec<CpuPoint> {
        self.inner.lock().state.cpu_history()
    }

    pub fn performance_metrics(&self) -> PerformanceMetrics {
        self.inner.lock().state.performance_metrics()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.inner.lock().state.snapshot()
    }
}

// Implement trait interfaces
impl TelemetryQuery for TelemetryEngine {
    fn mode(&self) -> BackendMode {
        TelemetryEngine::mode(self)
    }

    fn memory_usage(&self) -> MemoryUsage {
        TelemetryEngine::memory_usage(self)
    }

    fn gc_stats(&self) -> GcStats {
        TelemetryEngine::gc_stats(self)
    }

    fn cpu_impact(&self) -> f64 {
        TelemetryEngine::cpu_impact(self)
    }

    fn fragmentation(&self) -> FragmentationStatus {
        TelemetryEngine::fragmentation(self)
    }

    fn recent_activities(&self) -> Vec<Activity> {
        TelemetryEngine::recent_activities(self)
    }

    fn blocks(&self) -> Vec<MemoryBlock> {
        TelemetryEngine::blocks(self)
    }

    fn algorithms(&self) -> Vec<Algorithm> {
        TelemetryEngine::algorithms(self)
    }

    fn settings(&self) -> Settings {
        TelemetryEngine::settings(self)
    }

    fn memory_history(&self) -> Vec<MemorySample> {
        TelemetryEngine::memory_history(self)
    }

    fn gc_history(&self) -> Vec<GcHistoryPoint> {
        TelemetryEngine::gc_history(self)
    }

    fn allocation_history(&self) -> Vec<AllocationPoint> {
        TelemetryEngine::allocation_history(self)
    }

    fn cpu_history(&self) -> Vec<CpuPoint> {
        TelemetryEngine::cpu_history(self)
    }

    fn performance_metrics(&self) -> PerformanceMetrics {
        TelemetryEngine::performance_metrics(self)
    }

    fn snapshot(&self) -> TelemetrySnapshot {
        TelemetryEngine::snapshot(self)
    }
}

impl TelemetryCommands for TelemetryEngine {
    fn run_collection(&self) -> TelemetryResult<Deferred<CollectionOutcome>> {
        TelemetryEngine::run_collection(self)
    }

    fn optimize_memory(&self) -> TelemetryResult<Deferred<OptimizationOutcome>> {
        TelemetryEngine::optimize_memory(self)
    }

    fn defragment_memory(&self) -> TelemetryResult<Deferred<DefragmentationOutcome>> {
        TelemetryEngine::defragment_memory(self)
    }

    fn update_settings(&self, update: &SettingsUpdate) -> TelemetryResult<Settings> {
        TelemetryEngine::update_settings(self, update)
    }
}
