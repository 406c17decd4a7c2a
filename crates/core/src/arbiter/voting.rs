//! Vote-based selection.
//!
//! Every queued block is pooled with the mask of predictors proposing it.
//! Blocks with two or more votes are considered first, then single-vote
//! blocks, each class in ascending block order. Every considered block is
//! purged from all queues, admitted or not.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use super::{Candidate, PrefetchArbiter};
use crate::cache::CacheProbe;

impl PrefetchArbiter {
    pub(super) fn select_voting(
        &mut self,
        target_count: usize,
        probe: &dyn CacheProbe,
    ) -> Vec<Candidate> {
        let mut votes: BTreeMap<u64, u32> = BTreeMap::new();
        for &id in &self.order {
            for candidate in self.queues[id].iter() {
                *votes.entry(candidate.block()).or_insert(0) |= 1 << id;
            }
        }

        let mut selected: Vec<Candidate> = Vec::with_capacity(target_count);
        let mut considered: BTreeSet<u64> = BTreeSet::new();

        for shared in [true, false] {
            for (&blk, &mask) in &votes {
                if selected.len() >= target_count {
                    break;
                }
                if (mask.count_ones() > 1) != shared {
                    continue;
                }
                let Some(mut candidate) = self
                    .order
                    .iter()
                    .find_map(|&id| self.queues[id].find_block(blk))
                    .cloned()
                else {
                    continue;
                };
                let _ = considered.insert(blk);

                if probe.probe(candidate.pf_address).is_redundant() {
                    trace!(block = blk, "already cached, dropped");
                    continue;
                }
                candidate.overlap_mask = mask;
                self.metrics
                    .record_sent(candidate.predictor_id, candidate.pf_address);
                trace!(block = blk, votes = mask.count_ones(), "elected");
                selected.push(candidate);
            }
        }

        for queue in &mut self.queues {
            let _ = queue.purge(|blk| considered.contains(&blk));
        }
        selected
    }
}
