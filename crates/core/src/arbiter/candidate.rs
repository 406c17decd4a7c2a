//! Prefetch candidates.

use crate::common::addr::block;
use crate::common::constants::MAX_PREDICTORS;

/// Cache level a candidate is meant to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum FillLevel {
    /// First-level instruction cache.
    #[default]
    L1,
    /// Second-level cache.
    L2,
}

/// A proposed prefetch plus its provenance.
///
/// Two candidates are duplicates when their `pf_address` falls in the same
/// block; no other field takes part in the comparison.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Instruction pointer that triggered the proposal.
    pub origin_ip: u64,
    /// Address whose access triggered the proposal.
    pub base_address: u64,
    /// Address to prefetch.
    pub pf_address: u64,
    /// Requested fill level.
    pub fill_level: FillLevel,
    /// 4 KiB page of `pf_address`.
    pub page: u64,
    /// Cleared by a producer to retract the proposal.
    pub valid: bool,
    /// Producer-defined age.
    pub age: u32,
    /// Predictor that won the candidate.
    pub predictor_id: usize,
    /// Bitmask of every predictor that proposed this block in one
    /// arbitration cycle, the winner included.
    pub overlap_mask: u32,
    /// Producer-defined timestamp (the driver uses the cycle number).
    pub timestamp: u64,
    /// Producer-defined source tag, `-1` when unused.
    pub source_entity: i64,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.same_block(other)
    }
}

impl Eq for Candidate {}

impl Candidate {
    /// Creates a valid L1 candidate for `pf_address` proposed by `predictor_id`.
    ///
    /// # Panics
    ///
    /// Panics if `predictor_id` does not fit the overlap mask.
    pub fn new(predictor_id: usize, pf_address: u64) -> Self {
        assert!(
            predictor_id < MAX_PREDICTORS,
            "predictor id {predictor_id} out of range"
        );
        Self {
            origin_ip: 0,
            base_address: 0,
            pf_address,
            fill_level: FillLevel::L1,
            page: pf_address >> 12,
            valid: true,
            age: 0,
            predictor_id,
            overlap_mask: 1 << predictor_id,
            timestamp: 0,
            source_entity: -1,
        }
    }

    /// Sets the triggering instruction pointer.
    #[must_use]
    pub const fn with_origin(mut self, ip: u64) -> Self {
        self.origin_ip = ip;
        self
    }

    /// Sets the triggering access address.
    #[must_use]
    pub const fn with_base(mut self, address: u64) -> Self {
        self.base_address = address;
        self
    }

    /// Sets the requested fill level.
    #[must_use]
    pub const fn with_fill_level(mut self, level: FillLevel) -> Self {
        self.fill_level = level;
        self
    }

    /// Sets the timestamp.
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets the source tag.
    #[must_use]
    pub const fn with_source_entity(mut self, source: i64) -> Self {
        self.source_entity = source;
        self
    }

    /// Block number of `pf_address`.
    #[inline]
    pub const fn block(&self) -> u64 {
        block(self.pf_address)
    }

    /// Returns `true` if both candidates target the same block.
    #[inline]
    pub const fn same_block(&self, other: &Self) -> bool {
        self.block() == other.block()
    }

    /// Adds `predictor_id` to the overlap mask.
    pub fn add_overlap(&mut self, predictor_id: usize) {
        self.overlap_mask |= 1 << predictor_id;
    }

    /// Returns `true` if `predictor_id` proposed this block.
    pub const fn proposed_by(&self, predictor_id: usize) -> bool {
        self.overlap_mask & (1 << predictor_id) != 0
    }

    /// Returns `true` if more than one predictor proposed this block.
    pub const fn is_shared(&self) -> bool {
        self.overlap_mask.count_ones() > 1
    }

    /// Ids in the overlap mask, ascending.
    pub fn proposers(&self) -> impl Iterator<Item = usize> + '_ {
        (0..MAX_PREDICTORS).filter(|&id| self.proposed_by(id))
    }
}
