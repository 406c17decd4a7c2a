//! Priority-ordered round-robin selection.

use tracing::trace;

use super::{Candidate, PrefetchArbiter};
use crate::cache::CacheProbe;

impl PrefetchArbiter {
    /// Predictors take turns in priority order, one front candidate per
    /// turn, until the budget is met, the queues are drained, or every
    /// remaining predictor has used up its quota.
    pub(super) fn select_round_robin(
        &mut self,
        target_count: usize,
        probe: &dyn CacheProbe,
    ) -> Vec<Candidate> {
        let quotas = self.quota_enabled.then(|| self.allocate());
        let mut admitted = vec![0usize; self.queues.len()];
        let mut selected: Vec<Candidate> = Vec::with_capacity(target_count);

        while selected.len() < target_count && self.queued_total() > 0 {
            let mut progressed = false;

            for pos in 0..self.order.len() {
                if selected.len() >= target_count {
                    break;
                }
                let id = self.order[pos];
                if quotas.as_ref().is_some_and(|q| admitted[id] >= q[id]) {
                    continue;
                }
                let Some(front) = self.queues[id].front() else {
                    continue;
                };
                let (blk, pf_address) = (front.block(), front.pf_address);

                if let Some(existing) = selected.iter_mut().find(|c| c.block() == blk) {
                    existing.add_overlap(id);
                    let _ = self.queues[id].pop();
                    progressed = true;
                    trace!(predictor = id, block = blk, "overlapping proposal merged");
                    continue;
                }

                let redundant = probe.probe(pf_address).is_redundant();
                let Some(candidate) = self.queues[id].pop() else {
                    continue;
                };
                progressed = true;
                if redundant {
                    trace!(predictor = id, block = blk, "already cached, dropped");
                    continue;
                }

                admitted[id] += 1;
                self.metrics.record_sent(id, pf_address);
                selected.push(candidate);
            }

            if !progressed {
                break;
            }
        }
        selected
    }
}
