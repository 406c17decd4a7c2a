//! Feature vector construction.
//!
//! The filter scores a candidate from eight features mixing the candidate
//! itself with recent control-flow and fetch history:
//!
//! | slot | feature                                   |
//! |------|-------------------------------------------|
//! | 0    | candidate block                           |
//! | 1    | candidate block, low 24 bits              |
//! | 2    | last demand block `>> 6`, low 24 bits     |
//! | 3    | last demand block `>> 6`                  |
//! | 4    | taken-branch history (32 bits)            |
//! | 5    | last branch target block                  |
//! | 6    | last issued prefetch block                |
//! | 7    | branch-type history (3 bits per branch)   |
//!
//! Slots 2 and 3 shift the demand *block* once more, which folds sixty-four
//! neighbouring blocks onto one feature value.

use crate::common::addr::block;
use crate::common::constants::LOG2_BLOCK_SIZE;
use crate::common::data::BranchKind;

/// Number of feature slots produced by [`FeatureHistory::features`].
pub const FEATURE_COUNT: usize = 8;

/// Width of the taken-branch history.
const BRANCH_HISTORY_BITS: u32 = 32;

/// Width of the branch-type history.
const BRANCH_TYPE_HISTORY_BITS: u32 = 32;

const LOW_24: u64 = 0xff_ffff;

/// Running history the feature vector is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureHistory {
    branch_history: u64,
    branch_type_history: u64,
    last_target: u64,
    last_access: u64,
    last_prefetch: u64,
}

impl FeatureHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a resolved branch into the histories.
    pub fn record_branch(&mut self, kind: BranchKind, target: u64) {
        self.branch_history = ((self.branch_history << 1) | u64::from(target != 0))
            & ((1u64 << BRANCH_HISTORY_BITS) - 1);
        self.branch_type_history = ((self.branch_type_history << 3) | kind.code())
            & ((1u64 << BRANCH_TYPE_HISTORY_BITS) - 1);
        self.last_target = target;
    }

    /// Records a demand access.
    pub fn record_access(&mut self, address: u64) {
        self.last_access = block(address);
    }

    /// Records an issued prefetch.
    pub fn record_prefetch(&mut self, address: u64) {
        self.last_prefetch = block(address);
    }

    /// Taken-branch history bits.
    pub fn branch_history(&self) -> u64 {
        self.branch_history
    }

    /// Branch-type history bits.
    pub fn branch_type_history(&self) -> u64 {
        self.branch_type_history
    }

    /// Builds the feature vector for a candidate at `pf_address`.
    pub fn features(&self, pf_address: u64) -> Vec<u64> {
        let pf_block = block(pf_address);
        let access = self.last_access >> LOG2_BLOCK_SIZE;
        vec![
            pf_block,
            pf_block & LOW_24,
            access & LOW_24,
            access,
            self.branch_history,
            block(self.last_target),
            self.last_prefetch,
            self.branch_type_history,
        ]
    }
}
