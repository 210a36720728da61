/*!
 * Block Generation
 * Partitions the simulated capacity into a fresh set of status-tagged blocks
 *
 * Every block receives `MIN_BLOCK_KIB` up front. The capacity left over is
 * split front to back: block `i` draws an extra share uniformly from
 * `[0, remaining / blocks_left]` and the final block takes whatever remains,
 * so the sizes always sum to the total exactly.
 */

use super::types::{BlockStatus, MemoryBlock};
use crate::core::limits::{BLOCK_COUNT, MIN_BLOCK_KIB};
use crate::core::random::RandomSource;

/// Probability split: above this draw a block is free
const FREE_ABOVE: f64 = 0.7;

/// Second draw for non-free blocks: above this the block is active
const ACTIVE_ABOVE: f64 = 0.5;

/// Generate `BLOCK_COUNT` blocks covering `total_kib`
pub fn generate_blocks(total_kib: u64, rng: &mut dyn RandomSource) -> Vec<MemoryBlock> {
    let count = BLOCK_COUNT as u64;
    let mut remaining = total_kib.saturating_sub(MIN_BLOCK_KIB * count);

    (0..count)
        .map(|i| {
            let blocks_left = count - i;
            let extra = if blocks_left == 1 {
                remaining
            } else {
                rng.next_in_range(0, remaining / blocks_left + 1)
            };
            remaining -= extra;

            MemoryBlock {
                id: (i + 1) as u32,
                size_kib: MIN_BLOCK_KIB + extra,
                status: draw_status(rng),
            }
        })
        .collect()
}

fn draw_status(rng: &mut dyn RandomSource) -> BlockStatus {
    if rng.next_unit() > FREE_ABOVE {
        BlockStatus::Free
    } else if rng.next_unit() > ACTIVE_ABOVE {
        BlockStatus::Active
    } else {
        BlockStatus::Fragmented
    }
}
