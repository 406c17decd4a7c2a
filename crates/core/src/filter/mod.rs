//! Perceptron-based prefetch filter (PPF).
//!
//! A hashed, delayed-reward perceptron that decides whether a prefetch
//! candidate is worth issuing. Each candidate is described by a fixed-length
//! feature vector; every feature selects one signed weight from its own
//! table and the sum of the selected weights is the candidate's score.
//!
//! Decisions are remembered in two direct-mapped tracking tables (accepted
//! and rejected) until the outcome is known:
//! 1. **Outcome training:** a later demand access to the same block resolves
//!    the entry through [`Ppf::observe`].
//! 2. **Eviction training:** a conflicting insert displaces the entry before
//!    any outcome arrived; unless the model was already confident, its
//!    weights are decremented.
//!
//! Entries scored beyond the training threshold are never trained.

/// Feature vector construction from branch and fetch history.
pub mod features;

/// Diagnostic counters.
pub mod stats;

/// Direct-mapped tracking tables.
pub mod tracking;

/// Hashed saturating weight tables.
pub mod weights;

use std::fmt;

use tracing::{debug, trace};

use crate::common::addr::block;
use crate::config::FilterParams;

pub use self::features::{FEATURE_COUNT, FeatureHistory};
pub use self::stats::FilterStats;
pub use self::tracking::{Evicted, TrackingTable};
pub use self::weights::WeightTables;

/// Binary filter decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// Issue the prefetch.
    Accept,
    /// Drop the prefetch.
    Reject,
}

/// Multi-level filter decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterLevel {
    /// Prefetch into the L1.
    L1,
    /// Prefetch into the L2 only.
    L2,
    /// Drop the prefetch.
    Reject,
}

/// Which tracking table a decision was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Accepted,
    Rejected,
}

/// Learned prefetch filter instance.
#[derive(Debug, Clone)]
pub struct Ppf {
    id: usize,
    params: FilterParams,
    weights: WeightTables,
    accepted: TrackingTable,
    rejected: TrackingTable,
    stats: FilterStats,
}

impl Ppf {
    /// Creates a filter scoring `slots`-long feature vectors.
    ///
    /// # Arguments
    ///
    /// * `id` - Predictor id the filter belongs to, used in logs and reports.
    /// * `slots` - Feature vector length (one weight table per slot).
    /// * `params` - Table sizes and thresholds.
    pub fn new(id: usize, slots: usize, params: &FilterParams) -> Self {
        Self {
            id,
            params: params.clone(),
            weights: WeightTables::new(slots, params.table_size, params.max_weight),
            accepted: TrackingTable::new(params.tracking_table_size),
            rejected: TrackingTable::new(params.tracking_table_size),
            stats: FilterStats::new(slots, params.table_size, params.max_weight),
        }
    }

    /// Predictor id this filter belongs to.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Parameters the filter was built with.
    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Weight tables.
    pub fn weights(&self) -> &WeightTables {
        &self.weights
    }

    /// Diagnostic counters.
    pub fn stats(&self) -> &FilterStats {
        &self.stats
    }

    /// Sum of the weights selected by `features`.
    pub fn score(&self, features: &[u64]) -> i32 {
        self.weights.sum(features)
    }

    /// Returns `true` if the block of `address` has a pending accept.
    pub fn is_accepted(&self, address: u64) -> bool {
        self.accepted.contains(address)
    }

    /// Returns `true` if the block of `address` has a pending reject.
    pub fn is_rejected(&self, address: u64) -> bool {
        self.rejected.contains(address)
    }

    /// Returns `true` if the block of `address` has any pending decision.
    pub fn is_tracked(&self, address: u64) -> bool {
        self.is_accepted(address) || self.is_rejected(address)
    }

    /// Binary decision for a candidate at `address`.
    ///
    /// A block with a pending decision in either table is rejected without
    /// scoring.
    pub fn decide(&mut self, address: u64, features: Vec<u64>) -> Decision {
        let Some(score) = self.evaluate(address, &features) else {
            self.stats.rejects += 1;
            return Decision::Reject;
        };

        if score > self.params.accept_threshold {
            self.track(Disposition::Accepted, address, features);
            self.stats.accepts += 1;
            trace!(filter = self.id, block = block(address), score, "accept");
            Decision::Accept
        } else {
            self.track(Disposition::Rejected, address, features);
            self.stats.rejects += 1;
            trace!(filter = self.id, block = block(address), score, "reject");
            Decision::Reject
        }
    }

    /// Multi-level decision for a candidate at `address`.
    ///
    /// L2 decisions are tracked in the rejected table: the candidate did not
    /// earn an L1 slot.
    pub fn decide_level(&mut self, address: u64, features: Vec<u64>) -> FilterLevel {
        let Some(score) = self.evaluate(address, &features) else {
            self.stats.rejects += 1;
            return FilterLevel::Reject;
        };

        let level = if score > self.params.accept_threshold {
            self.track(Disposition::Accepted, address, features);
            self.stats.accepts += 1;
            FilterLevel::L1
        } else if score > self.params.l2_threshold {
            self.track(Disposition::Rejected, address, features);
            self.stats.l2_accepts += 1;
            FilterLevel::L2
        } else {
            self.track(Disposition::Rejected, address, features);
            self.stats.rejects += 1;
            FilterLevel::Reject
        };
        trace!(filter = self.id, block = block(address), score, ?level, "decide");
        level
    }

    /// Resolves the pending decision for the block of `address` with the
    /// outcome of a demand access.
    ///
    /// A rejected entry is reinforced by a miss and penalised by a hit; an
    /// accepted entry the other way round. Untracked blocks are ignored.
    pub fn observe(&mut self, address: u64, cache_hit: bool) {
        let in_accepted = self.accepted.contains(address);
        let in_rejected = self.rejected.contains(address);
        assert!(
            !(in_accepted && in_rejected),
            "filter {}: block {:#x} tracked in both tables",
            self.id,
            block(address)
        );

        let (disposition, entry) = if in_accepted {
            self.stats.accept_triggers += 1;
            (Disposition::Accepted, self.accepted.remove(address))
        } else if in_rejected {
            self.stats.reject_triggers += 1;
            (Disposition::Rejected, self.rejected.remove(address))
        } else {
            return;
        };
        let Some(entry) = entry else {
            return;
        };

        let score = self.weights.sum(&entry.features);
        if score.abs() > self.params.training_threshold {
            trace!(filter = self.id, block = block(address), score, "confident, not trained");
            return;
        }

        let confirmed = (disposition == Disposition::Accepted) == cache_hit;
        self.train(&entry.features, if confirmed { 1 } else { -1 });
    }

    /// Scores a candidate, or returns `None` if its block is already pending.
    fn evaluate(&mut self, address: u64, features: &[u64]) -> Option<i32> {
        assert_eq!(
            features.len(),
            self.weights.slots(),
            "filter {}: feature vector length mismatch",
            self.id
        );

        if self.rejected.contains(address) {
            self.stats.reject_table_hits += 1;
            return None;
        }
        if self.accepted.contains(address) {
            self.stats.accept_table_hits += 1;
            return None;
        }

        for (slot, &feature) in features.iter().enumerate() {
            self.stats.record_index(slot, self.weights.index(feature));
        }
        let score = self.weights.sum(features);
        self.stats.record_score(score);
        Some(score)
    }

    fn track(&mut self, disposition: Disposition, address: u64, features: Vec<u64>) {
        let table = match disposition {
            Disposition::Accepted => &mut self.accepted,
            Disposition::Rejected => &mut self.rejected,
        };
        let Some(evicted) = table.insert(address, features) else {
            return;
        };

        let score = self.weights.sum(&evicted.features);
        if score.abs() <= self.params.training_threshold {
            self.stats.eviction_updates += 1;
            debug!(
                filter = self.id,
                evicted = block(evicted.address),
                score,
                ?disposition,
                "unresolved entry evicted, penalising"
            );
            self.train(&evicted.features, -1);
        }
    }

    fn train(&mut self, features: &[u64], delta: i32) {
        for (slot, &feature) in features.iter().enumerate() {
            if self.weights.adjust(slot, feature, delta) {
                if delta > 0 {
                    self.stats.increments += 1;
                } else {
                    self.stats.decrements += 1;
                }
            }
        }
    }
}

impl fmt::Display for Ppf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "PPF[{}] accept > {}, l2 > {}, train |score| <= {}",
            self.id,
            self.params.accept_threshold,
            self.params.l2_threshold,
            self.params.training_threshold
        )?;
        write!(f, "{}", self.stats)?;
        writeln!(
            f,
            "  pending             accepted {}/{}, rejected {}/{}",
            self.accepted.len(),
            self.accepted.capacity(),
            self.rejected.len(),
            self.rejected.capacity()
        )?;
        for slot in 0..self.weights.slots() {
            write!(f, "  weights[{slot}]        ")?;
            for count in self.weights.histogram(slot) {
                write!(f, " {count}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
