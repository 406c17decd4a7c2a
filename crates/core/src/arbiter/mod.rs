//! Multi-predictor prefetch arbiter.
//!
//! Every sub-predictor owns a bounded candidate queue. Once per cycle the
//! arbiter drains the queues into at most `target_count` candidates using one
//! of two policies:
//! 1. **Round robin** ([`ArbitrationPolicy::RoundRobin`]): predictors take
//!    turns in priority order, each bounded by an optional quota derived
//!    from its runtime metrics.
//! 2. **Voting** ([`ArbitrationPolicy::Voting`]): blocks proposed by several
//!    predictors win first.
//!
//! Both policies collapse proposals for the same block into one output
//! candidate whose `overlap_mask` names every proposer, and both drop
//! candidates the cache probe reports resident or already in flight.
//!
//! The arbiter also owns the [`EpochTracker`] fed back by the host.

/// Prefetch candidate type.
pub mod candidate;

/// Epoch-windowed feedback metrics.
pub mod metrics;

/// Bounded per-predictor FIFO.
pub mod queue;

mod round_robin;
mod voting;

use std::fmt;

use tracing::debug;

use crate::cache::CacheProbe;
use crate::common::constants::MAX_PREDICTORS;
use crate::config::{ArbiterConfig, ArbitrationPolicy};

pub use self::candidate::{Candidate, FillLevel};
pub use self::metrics::{EpochTracker, PredictorMetrics};
pub use self::queue::PredictorQueue;

/// Per-cycle selection over the predictor queues.
#[derive(Debug, Clone)]
pub struct PrefetchArbiter {
    queues: Vec<PredictorQueue>,
    order: Vec<usize>,
    policy: ArbitrationPolicy,
    quota_enabled: bool,
    metrics: EpochTracker,
    scenarios: Vec<u64>,
}

impl PrefetchArbiter {
    /// Creates an arbiter for `predictors` predictors in id priority order.
    ///
    /// # Panics
    ///
    /// Panics if `predictors` is zero or exceeds [`MAX_PREDICTORS`].
    pub fn new(predictors: usize, config: &ArbiterConfig) -> Self {
        assert!(
            (1..=MAX_PREDICTORS).contains(&predictors),
            "arbiter supports 1..={MAX_PREDICTORS} predictors, got {predictors}"
        );
        Self {
            queues: (0..predictors)
                .map(|_| PredictorQueue::new(config.queue_capacity))
                .collect(),
            order: (0..predictors).collect(),
            policy: config.policy,
            quota_enabled: config.quota_enabled,
            metrics: EpochTracker::new(predictors, config),
            scenarios: vec![0; 1 << predictors],
        }
    }

    /// Number of predictors.
    pub fn predictors(&self) -> usize {
        self.queues.len()
    }

    /// Active selection policy.
    pub fn policy(&self) -> ArbitrationPolicy {
        self.policy
    }

    /// Queue of predictor `id`.
    pub fn queue(&self, id: usize) -> &PredictorQueue {
        &self.queues[id]
    }

    /// Candidates queued across all predictors.
    pub fn queued_total(&self) -> usize {
        self.queues.iter().map(PredictorQueue::len).sum()
    }

    /// Predictor ids, highest priority first.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Feedback metrics.
    pub fn metrics(&self) -> &EpochTracker {
        &self.metrics
    }

    /// Per-call counts of which queues were non-empty, indexed by bitmask.
    pub fn scenarios(&self) -> &[u64] {
        &self.scenarios
    }

    /// Queues `candidate` for predictor `id`. A full queue drops it.
    ///
    /// The candidate's `predictor_id` and `overlap_mask` are reset to `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a known predictor.
    pub fn enqueue(&mut self, id: usize, mut candidate: Candidate) -> bool {
        assert!(id < self.queues.len(), "unknown predictor id {id}");
        candidate.predictor_id = id;
        candidate.overlap_mask = 1 << id;
        let address = candidate.pf_address;
        let queued = self.queues[id].push(candidate);
        if !queued {
            debug!(predictor = id, address, "queue full, candidate dropped");
        }
        queued
    }

    /// Selects at most `target_count` candidates for this cycle.
    ///
    /// The result never holds two candidates for the same block and never
    /// exceeds the number of candidates queued before the call.
    pub fn select(&mut self, target_count: usize, probe: &dyn CacheProbe) -> Vec<Candidate> {
        if target_count == 0 {
            return Vec::new();
        }
        let mut occupied = 0usize;
        for (id, queue) in self.queues.iter().enumerate() {
            if !queue.is_empty() {
                occupied |= 1 << id;
            }
        }
        if occupied == 0 {
            return Vec::new();
        }
        self.scenarios[occupied] = self.scenarios[occupied].saturating_add(1);

        match self.policy {
            ArbitrationPolicy::RoundRobin => self.select_round_robin(target_count, probe),
            ArbitrationPolicy::Voting => self.select_voting(target_count, probe),
        }
    }

    /// Per-predictor quotas for one round-robin call.
    ///
    /// Idle predictors and predictors without accuracy or coverage evidence
    /// get the exploration floor of 1. Otherwise the quota scales the queue
    /// length by coverage times accuracy, divided by harmfulness when
    /// any harm was observed, clamped to 1 and offset by the floor.
    ///
    /// The per-call target count plays no part in the quota, so it is not
    /// taken as an argument; [`select`](Self::select) bounds the total.
    pub fn allocate(&self) -> Vec<usize> {
        (0..self.queues.len())
            .map(|id| {
                let queued = self.queues[id].len();
                let accuracy = self.metrics.accuracy(id);
                let coverage = self.metrics.coverage(id);
                if queued == 0 || accuracy <= 0.0 || coverage <= 0.0 {
                    return 1;
                }
                let harm = self.metrics.harmfulness(id);
                let factor = if harm > 0.0 {
                    (coverage / harm) * accuracy
                } else {
                    coverage * accuracy
                };
                (queued as f64 * factor.clamp(0.0, 1.0)).round() as usize + 1
            })
            .collect()
    }

    /// Moves predictor `id` to the front of the priority order.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a known predictor.
    pub fn promote(&mut self, id: usize) {
        let Some(pos) = self.order.iter().position(|&p| p == id) else {
            panic!("unknown predictor id {id}");
        };
        let _ = self.order.remove(pos);
        self.order.insert(0, id);
    }

    /// Replaces the priority order.
    ///
    /// # Panics
    ///
    /// Panics if `order` is not a permutation of all predictor ids.
    pub fn reorder(&mut self, order: &[usize]) {
        let mut sorted = order.to_vec();
        sorted.sort_unstable();
        assert!(
            sorted.iter().copied().eq(0..self.queues.len()),
            "priority order {order:?} is not a permutation of 0..{}",
            self.queues.len()
        );
        self.order = order.to_vec();
    }

    /// Records a demand access outcome for hit attribution.
    pub fn record_hit(&mut self, address: u64, cache_hit: bool, pf_hit: bool) {
        self.metrics.record_hit(address, cache_hit, pf_hit);
    }

    /// Charges predictors whose what-if cache missed a block the baseline
    /// cache holds. `predicted[i]` is predictor `i`'s snapshot result.
    pub fn record_harm(&mut self, address: u64, baseline_hit: bool, predicted: &[bool]) {
        if baseline_hit && predicted.iter().any(|&hit| !hit) {
            debug!(address, ?predicted, "harmful miss");
        }
        self.metrics.record_harm(baseline_hit, predicted);
    }

    /// Updates the saturating accuracy counters.
    pub fn record_accuracy(&mut self, address: u64, pf_hit: bool) {
        self.metrics.record_accuracy(address, pf_hit);
    }

    /// Advances the epoch clock. Returns `true` at an epoch boundary.
    pub fn advance_epoch(&mut self) -> bool {
        self.metrics.advance()
    }
}

impl fmt::Display for PrefetchArbiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Arbiter ({:?}, quotas {}), {} epochs",
            self.policy,
            if self.quota_enabled { "on" } else { "off" },
            self.metrics.epoch()
        )?;
        writeln!(f, "  order               {:?}", self.order)?;
        for (id, queue) in self.queues.iter().enumerate() {
            let m = self.metrics.predictor(id);
            writeln!(
                f,
                "  [{id}] queued {:>3}  dropped {:>8}  sent {:>10}  hits {:>10}  harmful {:>10}",
                queue.len(),
                queue.dropped(),
                m.total_sent,
                m.total_hits,
                m.total_harmful
            )?;
            writeln!(
                f,
                "       avg accuracy {:.4}  avg coverage {:.4}  avg harmfulness {:.4}",
                m.avg_accuracy, m.avg_coverage, m.avg_harmfulness
            )?;
        }
        writeln!(f, "  queue scenarios")?;
        for (mask, &count) in self.scenarios.iter().enumerate() {
            if count > 0 {
                writeln!(f, "    {mask:0width$b}  {count}", width = self.queues.len())?;
            }
        }
        Ok(())
    }
}
