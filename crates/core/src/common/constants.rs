//! Global constants.
//!
//! Block geometry matches the instruction cache line; every structure in the
//! crate that compares addresses does so at block granularity.

/// Number of bits to shift to convert between byte addresses and block numbers.
pub const LOG2_BLOCK_SIZE: u32 = 6;

/// Instruction cache block size in bytes (64 bytes).
pub const BLOCK_SIZE: u64 = 1 << LOG2_BLOCK_SIZE;

/// Mask selecting the byte offset within a block.
pub const BLOCK_OFFSET_MASK: u64 = BLOCK_SIZE - 1;

/// Upper bound on the number of sub-predictors behind one arbiter.
///
/// Overlap masks and queue-occupancy scenarios are bitmasks over predictor
/// ids, so this also bounds their width.
pub const MAX_PREDICTORS: usize = 8;
