//! Block address helpers.
//!
//! Candidates, tracking entries and shadow-cache lines are all keyed by the
//! block number (`address >> LOG2_BLOCK_SIZE`), never by the raw byte address.

use super::constants::{BLOCK_OFFSET_MASK, LOG2_BLOCK_SIZE};

/// Returns the block number containing `address`.
#[inline(always)]
pub const fn block(address: u64) -> u64 {
    address >> LOG2_BLOCK_SIZE
}

/// Returns `address` aligned down to the start of its block.
#[inline(always)]
pub const fn block_base(address: u64) -> u64 {
    address & !BLOCK_OFFSET_MASK
}

/// Returns `true` if both addresses fall in the same block.
#[inline(always)]
pub const fn same_block(a: u64, b: u64) -> bool {
    block(a) == block(b)
}
