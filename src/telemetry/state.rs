/*!
 * Telemetry State
 * Owns every simulated metric and implements the tick and command mutations
 *
 * All methods run to completion synchronously. Delaying the caller-visible
 * result of a command is the engine's job, never this module's.
 */

use super::blocks::generate_blocks;
use super::catalog::default_catalog;
use super::history;
use super::settings::{Settings, SettingsUpdate};
use super::types::*;
use crate::core::config::TelemetryConfig;
use crate::core::errors::TelemetryResult;
use crate::core::limits::*;
use crate::core::random::RandomSource;
use log::{debug, info};
use std::collections::VecDeque;
use time::OffsetDateTime;

/// Metrics observed after one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub usage: MemoryUsage,
    pub fragmentation: FragmentationStatus,
    pub cpu_impact: f64,
    /// Usage is above the threshold and automatic collection is enabled
    pub collection_due: bool,
    /// Collection the tick triggered, filled in by the engine
    pub auto_collection: Option<CollectionOutcome>,
}

pub struct TelemetryState {
    usage: MemoryUsage,
    gc_stats: GcStats,
    fragmentation: FragmentationStatus,
    cpu_impact: f64,
    /// Newest first
    activities: VecDeque<Activity>,
    /// Empty until first read or first command
    blocks: Vec<MemoryBlock>,
    algorithms: Vec<Algorithm>,
    settings: Settings,
    /// Oldest first
    history: VecDeque<MemorySample>,
    /// Ticks and commands
    rng: Box<dyn RandomSource>,
    /// Blocks and synthesized series; reads never touch `rng`
    chart_rng: Box<dyn RandomSource>,
}

impl TelemetryState {
    /// Build the seed state; the config is assumed validated
    ///
    /// Blocks and chart series draw from the config's chart source.
    pub fn new(config: &TelemetryConfig, rng: Box<dyn RandomSource>) -> Self {
        Self::with_sources(config, rng, config.chart_random_source())
    }

    pub fn with_sources(
        config: &TelemetryConfig,
        rng: Box<dyn RandomSource>,
        chart_rng: Box<dyn RandomSource>,
    ) -> Self {
        info!(
            "Telemetry state initialized: {} KiB total, {} KiB used, tick every {}s",
            config.total_kib,
            config.initial_used_kib,
            config.tick_interval.as_secs()
        );
        Self {
            usage: MemoryUsage::new(config.total_kib, config.initial_used_kib),
            gc_stats: GcStats::default(),
            fragmentation: FragmentationStatus::new(config.initial_fragmentation),
            cpu_impact: clamp_percentage(config.initial_cpu_impact),
            activities: VecDeque::with_capacity(MAX_ACTIVITIES + 1),
            blocks: Vec::new(),
            algorithms: default_catalog(),
            settings: Settings::with_time_interval(config.tick_interval.as_secs()),
            history: VecDeque::with_capacity(MAX_HISTORY_SAMPLES + 1),
            rng,
            chart_rng,
        }
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Perturb usage, fragmentation and CPU impact, then record a sample
    ///
    /// Does not run the collection itself; `collection_due` tells the caller
    /// whether one should follow.
    pub fn advance(&mut self) -> TickReport {
        let span = TICK_USED_DELTA_KIB;
        let delta = self.rng.next_in_range(0, 2 * span + 1) as i64 - span as i64;
        self.usage.shift(delta);

        let drift = (self.rng.next_unit() - 0.5) * TICK_FRAGMENTATION_SPAN;
        self.fragmentation.adjust(drift);

        let cpu_drift = (self.rng.next_unit() - 0.5) * TICK_CPU_SPAN;
        self.cpu_impact = clamp_percentage(self.cpu_impact + cpu_drift);

        self.history.push_back(MemorySample {
            timestamp: OffsetDateTime::now_utc(),
            used: self.usage.used,
            free: self.usage.free,
        });
        while self.history.len() > MAX_HISTORY_SAMPLES {
            self.history.pop_front();
        }

        debug!(
            "Tick: used {} KiB ({:+}), fragmentation {:.2}% ({}), cpu {:.2}%",
            self.usage.used,
            delta,
            self.fragmentation.percentage(),
            self.fragmentation.level(),
            self.cpu_impact
        );

        TickReport {
            usage: self.usage,
            fragmentation: self.fragmentation,
            cpu_impact: self.cpu_impact,
            collection_due: self.collection_due(),
            auto_collection: None,
        }
    }

    pub fn collection_due(&self) -> bool {
        self.settings.auto_collection
            && self.usage.usage_percentage() > self.settings.memory_threshold as f64
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Simulated collection pass
    pub fn collect(&mut self) -> CollectionOutcome {
        let duration_ms = self.rng.draw(COLLECTION_DURATION_MS);
        let requested = self.rng.draw(COLLECTION_RECLAIM_KIB);
        let objects_collected = self.rng.draw(COLLECTION_OBJECTS);
        let cpu_impact_percent = self.rng.draw(COLLECTION_CPU_PERCENT);
        let algorithm_idx = self.rng.next_index(self.algorithms.len());

        let reclaimed = self.usage.reclaim(requested);
        self.fragmentation.relieve(COLLECTION_FRAGMENTATION_RELIEF);

        let now = OffsetDateTime::now_utc();
        self.gc_stats.record_run(duration_ms, now);

        let algorithm = self.algorithms[algorithm_idx].name.clone();
        info!(
            "Collection #{} ({}): reclaimed {} KiB, {} objects, {}ms",
            self.gc_stats.runs_today, algorithm, reclaimed, objects_collected, duration_ms
        );
        self.activities.push_front(Activity {
            timestamp: now,
            algorithm,
            duration_ms,
            memory_reclaimed_kib: reclaimed,
            objects_collected,
            cpu_impact_percent,
        });
        self.activities.truncate(MAX_ACTIVITIES);

        self.regenerate_blocks();

        CollectionOutcome {
            success: true,
            duration_ms,
            memory_reclaimed_kib: reclaimed,
            objects_collected,
        }
    }

    pub fn optimize(&mut self) -> OptimizationOutcome {
        let requested = self.rng.draw(OPTIMIZE_RECLAIM_KIB);
        let reclaimed = self.usage.reclaim(requested);
        self.regenerate_blocks();

        info!("Optimization: reclaimed {} KiB", reclaimed);
        OptimizationOutcome {
            success: true,
            memory_reclaimed_kib: reclaimed,
        }
    }

    pub fn defragment(&mut self) -> DefragmentationOutcome {
        let requested = self.rng.draw(DEFRAGMENT_RECLAIM_KIB);
        let reclaimed = self.usage.reclaim(requested);
        self.fragmentation.relieve(DEFRAGMENT_FRAGMENTATION_RELIEF);
        self.regenerate_blocks();

        info!(
            "Defragmentation: reclaimed {} KiB, fragmentation now {:.2}% ({})",
            reclaimed,
            self.fragmentation.percentage(),
            self.fragmentation.level()
        );
        DefragmentationOutcome {
            success: true,
            memory_reclaimed_kib: reclaimed,
            fragmentation_reduced: DEFRAGMENT_FRAGMENTATION_RELIEF as u64,
        }
    }

    /// Validate and merge a partial update, returning the merged settings
    pub fn update_settings(&mut self, update: &SettingsUpdate) -> TelemetryResult<Settings> {
        let merged = self.settings.merged(update, &self.algorithms)?;
        if merged != self.settings {
            info!("Settings updated: {:?}", update);
        }
        self.settings = merged.clone();
        Ok(merged)
    }

    fn regenerate_blocks(&mut self) {
        self.blocks = generate_blocks(self.usage.total, self.chart_rng.as_mut());
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn memory_usage(&self) -> MemoryUsage {
        self.usage
    }

    pub fn gc_stats(&self) -> GcStats {
        self.gc_stats
    }

    pub fn cpu_impact(&self) -> f64 {
        self.cpu_impact
    }

    pub fn fragmentation(&self) -> FragmentationStatus {
        self.fragmentation
    }

    /// Newest first, at most `MAX_ACTIVITIES`
    pub fn recent_activities(&self) -> Vec<Activity> {
        self.activities.iter().cloned().collect()
    }

    pub fn recent_activities_up_to(&self, limit: usize) -> Vec<Activity> {
        self.activities.iter().take(limit).cloned().collect()
    }

    /// Current block generation, generated on first read
    pub fn blocks(&mut self) -> &[MemoryBlock] {
        if self.blocks.is_empty() {
            self.regenerate_blocks();
        }
        &self.blocks
    }

    pub fn algorithms(&self) -> &[Algorithm] {
        &self.algorithms
    }

    pub fn algorithm(&self, id: u32) -> Option<&Algorithm> {
        self.algorithms.iter().find(|a| a.id == id)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Oldest first, at most `MAX_HISTORY_SAMPLES`
    pub fn memory_history(&self) -> Vec<MemorySample> {
        self.history.iter().copied().collect()
    }

    pub fn gc_history(&mut self) -> Vec<GcHistoryPoint> {
        history::gc_history(OffsetDateTime::now_utc(), self.chart_rng.as_mut())
    }

    pub fn allocation_history(&mut self) -> Vec<AllocationPoint> {
        history::allocation_history(OffsetDateTime::now_utc(), self.chart_rng.as_mut())
    }

    pub fn cpu_history(&mut self) -> Vec<CpuPoint> {
        history::cpu_history(OffsetDateTime::now_utc(), self.chart_rng.as_mut())
    }

    pub fn performance_metrics(&mut self) -> PerformanceMetrics {
        history::performance_metrics(self.chart_rng.as_mut())
    }

    pub fn snapshot(&mut self) -> TelemetrySnapshot {
        let blocks = self.blocks().to_vec();
        TelemetrySnapshot {
            mode: BackendMode::Simulated,
            taken_at: OffsetDateTime::now_utc(),
            memory_usage: self.usage,
            gc_stats: self.gc_stats,
            cpu_impact: self.cpu_impact,
            fragmentation: self.fragmentation,
            recent_activities: self.recent_activities(),
            blocks,
            algorithms: self.algorithms.clone(),
            settings: self.settings.clone(),
            memory_history: self.memory_history(),
        }
    }
}
