//! Stride predictor.
//!
//! Tracks, per 4 KiB region, the last block accessed and the block stride
//! between consecutive accesses. Once the same stride repeats often enough
//! (a 2-bit confidence counter saturates) the next `degree` strides are
//! proposed.
//!
//! # Performance
//!
//! - **Time Complexity:** `on_access()` is O(1); `on_cycle()` is O(D) where D
//!   is the prefetch degree.
//! - **Space Complexity:** O(T) where T is the table size.

use super::{PrefetchSink, SubPredictor};
use crate::common::addr::block;
use crate::common::constants::LOG2_BLOCK_SIZE;

const REGION_SHIFT: u32 = 12;
const MAX_CONFIDENCE: u8 = 3;

#[derive(Debug, Default, Clone, Copy)]
struct StrideEntry {
    last_block: u64,
    stride: i64,
    confidence: u8,
}

/// Stride predictor state.
#[derive(Debug, Clone)]
pub struct StridePredictor {
    table: Vec<StrideEntry>,
    table_mask: usize,
    degree: usize,
    pending: Option<(u64, u64, i64)>,
    proposed: u64,
}

impl StridePredictor {
    /// Creates a predictor with `table_size` region entries (rounded up to
    /// a power of two) proposing `degree` strides ahead (at least one).
    pub fn new(table_size: usize, degree: usize) -> Self {
        let size = table_size.max(1).next_power_of_two();
        Self {
            table: vec![StrideEntry::default(); size],
            table_mask: size - 1,
            degree: degree.max(1),
            pending: None,
            proposed: 0,
        }
    }
}

impl SubPredictor for StridePredictor {
    fn name(&self) -> &'static str {
        "stride"
    }

    fn on_access(&mut self, address: u64, _cache_hit: bool, _prefetch_hit: bool) {
        let idx = ((address >> REGION_SHIFT) as usize) & self.table_mask;
        let entry = &mut self.table[idx];
        let blk = block(address);
        let stride = blk.wrapping_sub(entry.last_block) as i64;

        if stride == 0 {
            return;
        }
        if stride == entry.stride {
            if entry.confidence < MAX_CONFIDENCE {
                entry.confidence += 1;
            } else {
                self.pending = Some((address, blk, stride));
            }
        } else if entry.confidence > 0 {
            entry.confidence -= 1;
        } else {
            entry.stride = stride;
        }
        entry.last_block = blk;
    }

    fn on_cycle(&mut self, sink: &mut PrefetchSink) {
        let Some((address, blk, stride)) = self.pending.take() else {
            return;
        };
        for k in 1..=self.degree as i64 {
            let target = blk.wrapping_add(stride.wrapping_mul(k) as u64);
            sink.prefetch(address, address, target << LOG2_BLOCK_SIZE);
            self.proposed += 1;
        }
    }

    fn final_report(&self) -> String {
        format!(
            "stride: {} entries, degree {}, proposed {}",
            self.table.len(),
            self.degree,
            self.proposed
        )
    }
}
