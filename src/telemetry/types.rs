/*!
 * Telemetry Types
 * Simulated metrics, log entries and command outcomes
 */

use crate::core::limits::{FRAGMENTATION_LOW_BELOW, FRAGMENTATION_MEDIUM_BELOW};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Memory usage in KiB
///
/// `used + free == total` holds after every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

impl MemoryUsage {
    pub fn new(total: u64, used: u64) -> Self {
        let used = used.min(total);
        Self {
            total,
            used,
            free: total - used,
        }
    }

    /// Move usage by a signed delta, clamped to `[0, total]`
    pub fn shift(&mut self, delta: i64) {
        let used = if delta >= 0 {
            self.used.saturating_add(delta.unsigned_abs())
        } else {
            self.used.saturating_sub(delta.unsigned_abs())
        };
        self.set_used(used);
    }

    /// Release up to `kib`, returning what was actually released
    pub fn reclaim(&mut self, kib: u64) -> u64 {
        let before = self.used;
        self.set_used(before.saturating_sub(kib));
        before - self.used
    }

    pub fn usage_percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.used as f64 / self.total as f64 * 100.0
        }
    }

    fn set_used(&mut self, used: u64) {
        self.used = used.min(self.total);
        self.free = self.total - self.used;
    }
}

/// Fragmentation severity derived from the percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FragmentationLevel {
    Low,
    Medium,
    High,
}

impl FragmentationLevel {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage < FRAGMENTATION_LOW_BELOW {
            FragmentationLevel::Low
        } else if percentage < FRAGMENTATION_MEDIUM_BELOW {
            FragmentationLevel::Medium
        } else {
            FragmentationLevel::High
        }
    }
}

impl std::fmt::Display for FragmentationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FragmentationLevel::Low => write!(f, "Low"),
            FragmentationLevel::Medium => write!(f, "Medium"),
            FragmentationLevel::High => write!(f, "High"),
        }
    }
}

/// Fragmentation percentage with its level
///
/// Fields are private so the level can only change through the percentage.
/// Deserialization recomputes the level rather than trusting the input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawFragmentation")]
pub struct FragmentationStatus {
    percentage: f64,
    level: FragmentationLevel,
}

#[derive(Deserialize)]
struct RawFragmentation {
    percentage: f64,
}

impl From<RawFragmentation> for FragmentationStatus {
    fn from(raw: RawFragmentation) -> Self {
        Self::new(raw.percentage)
    }
}

impl FragmentationStatus {
    pub fn new(percentage: f64) -> Self {
        let percentage = clamp_percentage(percentage);
        Self {
            percentage,
            level: FragmentationLevel::from_percentage(percentage),
        }
    }

    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    pub fn level(&self) -> FragmentationLevel {
        self.level
    }

    pub fn adjust(&mut self, delta: f64) {
        *self = Self::new(self.percentage + delta);
    }

    /// Lower by `points`, floored at zero
    pub fn relieve(&mut self, points: f64) {
        self.adjust(-points);
    }
}

/// Clamp into `[0, 100]`; NaN collapses to zero
pub(crate) fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Garbage collection statistics
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcStats {
    pub runs_today: u32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_run: Option<OffsetDateTime>,
    pub avg_duration_ms: f64,
}

impl GcStats {
    /// Count a run and fold its duration into the running mean
    pub fn record_run(&mut self, duration_ms: u64, at: OffsetDateTime) {
        self.runs_today += 1;
        self.last_run = Some(at);
        let n = self.runs_today as f64;
        self.avg_duration_ms = (self.avg_duration_ms * (n - 1.0) + duration_ms as f64) / n;
    }
}

/// One collection recorded in the activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Name of the catalog algorithm credited with the run
    pub algorithm: String,
    pub duration_ms: u64,
    pub memory_reclaimed_kib: u64,
    pub objects_collected: u64,
    pub cpu_impact_percent: u64,
}

/// Block status tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStatus {
    Active,
    Free,
    Fragmented,
}

/// Synthetic unit of capacity, used only for visualization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryBlock {
    pub id: u32,
    pub size_kib: u64,
    pub status: BlockStatus,
}

/// Catalog entry describing a collection algorithm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Algorithm {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub performance_score: u8,
}

/// Usage sample appended on every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySample {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub used: u64,
    pub free: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcHistoryPoint {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPoint {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub allocated_kib: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuPoint {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub usage_percent: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub avg_response_time_ms: u64,
    pub peak_memory_usage_kib: u64,
    pub gc_efficiency: u64,
    pub memory_leaks: bool,
}

/// Result delivered when a collection completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionOutcome {
    pub success: bool,
    pub duration_ms: u64,
    pub memory_reclaimed_kib: u64,
    pub objects_collected: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationOutcome {
    pub success: bool,
    pub memory_reclaimed_kib: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefragmentationOutcome {
    pub success: bool,
    pub memory_reclaimed_kib: u64,
    pub fragmentation_reduced: u64,
}

/// Where the telemetry comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendMode {
    /// Values are generated in-process; no real memory manager is attached
    Simulated,
}

/// Every current query in one serializable value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub mode: BackendMode,
    #[serde(with = "time::serde::rfc3339")]
    pub taken_at: OffsetDateTime,
    pub memory_usage: MemoryUsage,
    pub gc_stats: GcStats,
    pub cpu_impact: f64,
    pub fragmentation: FragmentationStatus,
    pub recent_activities: Vec<Activity>,
    pub blocks: Vec<MemoryBlock>,
    pub algorithms: Vec<Algorithm>,
    pub settings: super::settings::Settings,
    pub memory_history: Vec<MemorySample>,
}
