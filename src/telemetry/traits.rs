/*!
 * Telemetry Traits
 * The query and command surface a UI driver consumes
 *
 * The simulated engine is one implementation; a backend attached to a real
 * memory manager would implement the same traits.
 */

use super::deferred::Deferred;
use super::settings::{Settings, SettingsUpdate};
use super::types::*;
use crate::core::errors::TelemetryResult;

/// Side-effect-free reads
pub trait TelemetryQuery: Send + Sync {
    fn mode(&self) -> BackendMode;

    fn memory_usage(&self) -> MemoryUsage;

    fn gc_stats(&self) -> GcStats;

    fn cpu_impact(&self) -> f64;

    fn fragmentation(&self) -> FragmentationStatus;

    /// Newest first, at most 20 entries
    fn recent_activities(&self) -> Vec<Activity>;

    /// Exactly 50 blocks
    fn blocks(&self) -> Vec<MemoryBlock>;

    fn algorithms(&self) -> Vec<Algorithm>;

    fn settings(&self) -> Settings;

    /// Oldest first, at most 100 samples
    fn memory_history(&self) -> Vec<MemorySample>;

    fn gc_history(&self) -> Vec<GcHistoryPoint>;

    fn allocation_history(&self) -> Vec<AllocationPoint>;

    fn cpu_history(&self) -> Vec<CpuPoint>;

    fn performance_metrics(&self) -> PerformanceMetrics;

    fn snapshot(&self) -> TelemetrySnapshot;
}

/// State-mutating commands with deferred results
pub trait TelemetryCommands: Send + Sync {
    fn run_collection(&self) -> TelemetryResult<Deferred<CollectionOutcome>>;

    fn optimize_memory(&self) -> TelemetryResult<Deferred<OptimizationOutcome>>;

    fn defragment_memory(&self) -> TelemetryResult<Deferred<DefragmentationOutcome>>;

    fn update_settings(&self, update: &SettingsUpdate) -> TelemetryResult<Settings>;
}

/// Full backend combining queries and commands
pub trait TelemetryBackend: TelemetryQuery + TelemetryCommands + Clone {}

impl<T> TelemetryBackend for T where T: TelemetryQuery + TelemetryCommands + Clone {}
