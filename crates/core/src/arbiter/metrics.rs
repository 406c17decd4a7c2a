//! Epoch-windowed per-predictor feedback.
//!
//! Every demand access advances the epoch clock. Within an epoch the tracker
//! counts, per predictor, how many prefetches were sent, how many of them were
//! later hit, and how often the predictor was blamed for a miss the baseline
//! cache would have hit. At each epoch boundary the derived ratios are
//! snapshotted, folded into running averages and the counts start over.
//!
//! # Derived metrics
//!
//! - **Accuracy:** `min(hits, sent) / sent`.
//! - **Coverage:** share of the epoch's cache hits credited to the predictor.
//!   Once a full epoch has completed the previous epoch's value is used.
//! - **Harmfulness:** harmful misses over the non-hit accesses of the epoch.
//!
//! Every ratio with a zero denominator is `0.0`.

use std::collections::VecDeque;

use tracing::debug;

use crate::common::addr::block;
use crate::config::ArbiterConfig;

#[derive(Debug, Clone, Copy)]
struct SentEntry {
    block: u64,
    credited: bool,
}

/// Feedback state of one predictor.
#[derive(Debug, Clone, Default)]
pub struct PredictorMetrics {
    /// Prefetches sent this epoch.
    pub sent: u64,
    /// Credited prefetch hits this epoch.
    pub hits: u64,
    /// Harmful misses charged this epoch.
    pub harmful: u64,
    /// Saturating confidence counter, halved every epoch.
    pub accuracy_counter: u64,

    /// Accuracy of the last completed epoch.
    pub last_accuracy: f64,
    /// Coverage of the last completed epoch.
    pub last_coverage: f64,
    /// Harmfulness of the last completed epoch.
    pub last_harmfulness: f64,
    /// Credited hits of the last completed epoch.
    pub last_hits: u64,

    /// Running mean of per-epoch accuracy.
    pub avg_accuracy: f64,
    /// Running mean of per-epoch coverage.
    pub avg_coverage: f64,
    /// Running mean of per-epoch harmfulness.
    pub avg_harmfulness: f64,

    /// Prefetches sent over the whole run.
    pub total_sent: u64,
    /// Credited hits over the whole run.
    pub total_hits: u64,
    /// Harmful misses over the whole run.
    pub total_harmful: u64,

    history: VecDeque<SentEntry>,
}

impl PredictorMetrics {
    /// Number of sent prefetches remembered for hit attribution.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn accuracy(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            self.hits.min(self.sent) as f64 / self.sent as f64
        }
    }
}

/// Running mean with an epoch-count denominator; the first sample seeds it.
fn fold(avg: f64, last: f64, n: u64) -> f64 {
    if n <= 1 || avg.abs() < f64::EPSILON {
        last
    } else {
        let n = n as f64;
        (avg * (n - 1.0) + last) / n
    }
}

/// Epoch clock and per-predictor metrics.
#[derive(Debug, Clone)]
pub struct EpochTracker {
    predictors: Vec<PredictorMetrics>,
    epoch_size: u64,
    history_capacity: usize,
    max_pf_hits: u64,

    cycles: u64,
    epoch_hits: u64,
    last_epoch_hits: u64,
    epoch: u64,
}

impl EpochTracker {
    /// Creates a tracker for `predictors` predictors.
    pub fn new(predictors: usize, config: &ArbiterConfig) -> Self {
        Self {
            predictors: vec![PredictorMetrics::default(); predictors],
            epoch_size: config.epoch_size,
            history_capacity: config.history_capacity,
            max_pf_hits: config.max_pf_hits,
            cycles: 0,
            epoch_hits: 0,
            last_epoch_hits: 0,
            epoch: 0,
        }
    }

    /// Metrics of predictor `id`.
    pub fn predictor(&self, id: usize) -> &PredictorMetrics {
        &self.predictors[id]
    }

    /// Completed epochs.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Accesses counted in the current epoch.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Cache hits counted in the current epoch.
    pub fn epoch_hits(&self) -> u64 {
        self.epoch_hits
    }

    /// Cache hits of the last completed epoch.
    pub fn last_epoch_hits(&self) -> u64 {
        self.last_epoch_hits
    }

    /// Records a prefetch sent on behalf of predictor `id`.
    pub fn record_sent(&mut self, id: usize, pf_address: u64) {
        let metrics = &mut self.predictors[id];
        metrics.sent = metrics.sent.saturating_add(1);
        metrics.total_sent = metrics.total_sent.saturating_add(1);
        if metrics.history.len() >= self.history_capacity {
            let _ = metrics.history.pop_front();
        }
        metrics.history.push_back(SentEntry {
            block: block(pf_address),
            credited: false,
        });
    }

    /// Credits prefetch hits to every predictor that sent the block.
    ///
    /// Each history entry is credited at most once.
    pub fn record_hit(&mut self, address: u64, cache_hit: bool, pf_hit: bool) {
        if cache_hit {
            self.epoch_hits = self.epoch_hits.saturating_add(1);
        }
        if !pf_hit {
            return;
        }
        let blk = block(address);
        for metrics in &mut self.predictors {
            let Some(entry) = metrics.history.iter_mut().find(|e| e.block == blk) else {
                continue;
            };
            if entry.credited {
                continue;
            }
            entry.credited = true;
            metrics.hits = metrics.hits.saturating_add(1).min(self.max_pf_hits);
            metrics.total_hits = metrics.total_hits.saturating_add(1);
        }
    }

    /// Moves each sender's accuracy counter up on a prefetch hit and down
    /// otherwise.
    pub fn record_accuracy(&mut self, address: u64, pf_hit: bool) {
        let blk = block(address);
        let cap = self.history_capacity as u64;
        for metrics in &mut self.predictors {
            if !metrics.history.iter().any(|e| e.block == blk) {
                continue;
            }
            metrics.accuracy_counter = if pf_hit {
                metrics.accuracy_counter.saturating_add(1).min(cap)
            } else {
                metrics.accuracy_counter.saturating_sub(1)
            };
        }
    }

    /// Charges every predictor whose what-if view missed a block the
    /// baseline view holds.
    ///
    /// # Panics
    ///
    /// Panics if `predicted` does not have one entry per predictor.
    pub fn record_harm(&mut self, baseline_hit: bool, predicted: &[bool]) {
        assert_eq!(
            predicted.len(),
            self.predictors.len(),
            "one snapshot result per predictor required"
        );
        if !baseline_hit {
            return;
        }
        for (metrics, &hit) in self.predictors.iter_mut().zip(predicted) {
            if !hit {
                metrics.harmful = metrics.harmful.saturating_add(1);
                metrics.total_harmful = metrics.total_harmful.saturating_add(1);
            }
        }
    }

    /// Accuracy of predictor `id` in the current epoch.
    pub fn accuracy(&self, id: usize) -> f64 {
        self.predictors[id].accuracy()
    }

    /// Coverage of predictor `id`.
    pub fn coverage(&self, id: usize) -> f64 {
        let metrics = &self.predictors[id];
        if self.last_epoch_hits > 0 {
            metrics.last_hits as f64 / self.last_epoch_hits as f64
        } else if self.epoch_hits > 0 {
            metrics.hits as f64 / self.epoch_hits as f64
        } else {
            0.0
        }
    }

    /// Harmfulness of predictor `id` in the current epoch.
    pub fn harmfulness(&self, id: usize) -> f64 {
        let metrics = &self.predictors[id];
        let misses = self.cycles.saturating_sub(self.epoch_hits);
        if metrics.sent == 0 || misses == 0 {
            0.0
        } else {
            metrics.harmful as f64 / misses as f64
        }
    }

    /// Advances the epoch clock by one access. Returns `true` if an epoch
    /// boundary was crossed.
    pub fn advance(&mut self) -> bool {
        self.cycles = self.cycles.saturating_add(1);
        if self.cycles < self.epoch_size {
            return false;
        }
        self.roll_over();
        true
    }

    fn roll_over(&mut self) {
        let n = self.epoch + 1;
        let misses = self.cycles.saturating_sub(self.epoch_hits);
        for (id, metrics) in self.predictors.iter_mut().enumerate() {
            metrics.last_accuracy = metrics.accuracy();
            metrics.last_coverage = if self.epoch_hits == 0 {
                0.0
            } else {
                metrics.hits as f64 / self.epoch_hits as f64
            };
            metrics.last_harmfulness = if metrics.sent == 0 || misses == 0 {
                0.0
            } else {
                metrics.harmful as f64 / misses as f64
            };
            metrics.last_hits = metrics.hits;

            metrics.avg_accuracy = fold(metrics.avg_accuracy, metrics.last_accuracy, n);
            metrics.avg_coverage = fold(metrics.avg_coverage, metrics.last_coverage, n);
            metrics.avg_harmfulness = fold(metrics.avg_harmfulness, metrics.last_harmfulness, n);

            debug!(
                epoch = n,
                predictor = id,
                sent = metrics.sent,
                hits = metrics.hits,
                harmful = metrics.harmful,
                accuracy = metrics.last_accuracy,
                coverage = metrics.last_coverage,
                harmfulness = metrics.last_harmfulness,
                "epoch closed"
            );

            metrics.accuracy_counter /= 2;
            metrics.history.clear();
            metrics.sent = 0;
            metrics.hits = 0;
            metrics.harmful = 0;
        }

        self.last_epoch_hits = self.epoch_hits;
        self.epoch_hits = 0;
        self.cycles = 0;
        self.epoch = n;
    }
}
