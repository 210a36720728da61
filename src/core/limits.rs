/*!
 * Simulation Limits and Constants
 *
 * Centralized location for the simulation's capacities, caps, ranges and
 * delays. Every memory quantity is expressed in KiB.
 */

use std::time::Duration;

/// One GiB expressed in KiB
pub const GIB_IN_KIB: u64 = 1024 * 1024;

/// One MiB expressed in KiB
pub const MIB_IN_KIB: u64 = 1024;

// =============================================================================
// INITIAL STATE
// =============================================================================

/// Simulated capacity (10 GiB)
pub const DEFAULT_TOTAL_KIB: u64 = 10 * GIB_IN_KIB;

/// Starting usage, 4.2 GiB rounded down to whole KiB
pub const DEFAULT_INITIAL_USED_KIB: u64 = (42 * GIB_IN_KIB) / 10;

/// Starting fragmentation percentage
pub const DEFAULT_INITIAL_FRAGMENTATION: f64 = 18.0;

/// Starting CPU impact percentage
pub const DEFAULT_INITIAL_CPU_IMPACT: f64 = 3.2;

/// Default tick cadence
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(2);

// =============================================================================
// FRAGMENTATION THRESHOLDS
// =============================================================================

/// Below this percentage fragmentation is Low
pub const FRAGMENTATION_LOW_BELOW: f64 = 10.0;

/// Below this percentage fragmentation is Medium, High otherwise
pub const FRAGMENTATION_MEDIUM_BELOW: f64 = 30.0;

// =============================================================================
// RETENTION CAPS
// =============================================================================

/// Activity log entries kept (newest first)
pub const MAX_ACTIVITIES: usize = 20;

/// Memory history samples kept (oldest first)
pub const MAX_HISTORY_SAMPLES: usize = 100;

/// Blocks per generation
pub const BLOCK_COUNT: usize = 50;

/// Size every block receives before the remaining capacity is partitioned
pub const MIN_BLOCK_KIB: u64 = 1024;

/// Points in each synthesized hourly series
pub const HOURLY_SERIES_POINTS: usize = 24;

// =============================================================================
// TICK PERTURBATION
// =============================================================================

/// Largest usage change per tick in either direction (50 MiB)
pub const TICK_USED_DELTA_KIB: u64 = 50 * MIB_IN_KIB;

/// Fragmentation moves within +/- half of this span per tick
pub const TICK_FRAGMENTATION_SPAN: f64 = 2.0;

/// CPU impact moves within +/- half of this span per tick
pub const TICK_CPU_SPAN: f64 = 1.0;

// =============================================================================
// COMMAND RANGES (half-open)
// =============================================================================

/// Collection pause, milliseconds
pub const COLLECTION_DURATION_MS: (u64, u64) = (100, 600);

/// Memory reclaimed by a collection (up to 500 MiB)
pub const COLLECTION_RECLAIM_KIB: (u64, u64) = (0, 500 * MIB_IN_KIB);

/// Objects swept by a collection
pub const COLLECTION_OBJECTS: (u64, u64) = (1_000, 11_000);

/// CPU cost of a collection, percent
pub const COLLECTION_CPU_PERCENT: (u64, u64) = (5, 20);

/// Fragmentation points removed by a collection
pub const COLLECTION_FRAGMENTATION_RELIEF: f64 = 5.0;

/// Memory reclaimed by an optimization pass (up to 200 MiB)
pub const OPTIMIZE_RECLAIM_KIB: (u64, u64) = (0, 200 * MIB_IN_KIB);

/// Completion delay of an optimization pass
pub const OPTIMIZE_DELAY: Duration = Duration::from_millis(500);

/// Memory reclaimed by defragmentation (up to 100 MiB)
pub const DEFRAGMENT_RECLAIM_KIB: (u64, u64) = (0, 100 * MIB_IN_KIB);

/// Fragmentation points removed by defragmentation
pub const DEFRAGMENT_FRAGMENTATION_RELIEF: f64 = 15.0;

/// Completion delay of defragmentation
pub const DEFRAGMENT_DELAY: Duration = Duration::from_millis(800);

// =============================================================================
// SETTINGS DOMAINS
// =============================================================================

/// Longest accepted tick cadence, seconds
pub const MAX_TIME_INTERVAL_SECS: u64 = 3600;

/// Largest accepted percentage
pub const MAX_PERCENT: u32 = 100;
