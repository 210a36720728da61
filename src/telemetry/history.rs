/*!
 * Synthesized History
 * Hourly series drawn fresh on every request; nothing here is retained
 */

use super::types::{AllocationPoint, CpuPoint, GcHistoryPoint, PerformanceMetrics};
use crate::core::limits::{COLLECTION_DURATION_MS, GIB_IN_KIB, HOURLY_SERIES_POINTS};
use crate::core::random::RandomSource;
use time::{Duration, OffsetDateTime};

const ALLOCATED_KIB: (u64, u64) = (GIB_IN_KIB, 3 * GIB_IN_KIB);
const CPU_USAGE_PERCENT: (u64, u64) = (5, 35);
const RESPONSE_TIME_MS: (u64, u64) = (50, 150);
const PEAK_MEMORY_KIB: (u64, u64) = (2 * GIB_IN_KIB, 10 * GIB_IN_KIB);
const GC_EFFICIENCY: (u64, u64) = (60, 100);
const LEAK_ABOVE: f64 = 0.8;

/// One timestamp per hour, oldest first, the last one at `now`
fn hourly(now: OffsetDateTime) -> impl Iterator<Item = OffsetDateTime> {
    let points = HOURLY_SERIES_POINTS as i64;
    (0..points).map(move |i| now - Duration::hours(points - 1 - i))
}

pub fn gc_history(now: OffsetDateTime, rng: &mut dyn RandomSource) -> Vec<GcHistoryPoint> {
    hourly(now)
        .map(|timestamp| GcHistoryPoint {
            timestamp,
            duration_ms: rng.draw(COLLECTION_DURATION_MS),
        })
        .collect()
}

pub fn allocation_history(now: OffsetDateTime, rng: &mut dyn RandomSource) -> Vec<AllocationPoint> {
    hourly(now)
        .map(|timestamp| AllocationPoint {
            timestamp,
            allocated_kib: rng.draw(ALLOCATED_KIB),
        })
        .collect()
}

pub fn cpu_history(now: OffsetDateTime, rng: &mut dyn RandomSource) -> Vec<CpuPoint> {
    hourly(now)
        .map(|timestamp| CpuPoint {
            timestamp,
            usage_percent: rng.draw(CPU_USAGE_PERCENT),
        })
        .collect()
}

pub fn performance_metrics(rng: &mut dyn RandomSource) -> PerformanceMetrics {
    PerformanceMetrics {
        avg_response_time_ms: rng.draw(RESPONSE_TIME_MS),
        peak_memory_usage_kib: rng.draw(PEAK_MEMORY_KIB),
        gc_efficiency: rng.draw(GC_EFFICIENCY),
        memory_leaks: rng.next_unit() > LEAK_ABOVE,
    }
}
