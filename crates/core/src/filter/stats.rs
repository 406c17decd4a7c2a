//! Diagnostic counters of one filter instance.
//!
//! None of these feed back into decisions; they are collected for the end of
//! run report only.

use std::fmt;

/// Counters and histograms of one [`Ppf`](super::Ppf).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterStats {
    /// Decisions short-circuited by a pending entry in the accepted table.
    pub accept_table_hits: u64,
    /// Decisions short-circuited by a pending entry in the rejected table.
    pub reject_table_hits: u64,
    /// Outcome observations resolved from the accepted table.
    pub accept_triggers: u64,
    /// Outcome observations resolved from the rejected table.
    pub reject_triggers: u64,
    /// Evicted tracking entries that were trained.
    pub eviction_updates: u64,
    /// Weight increments that applied.
    pub increments: u64,
    /// Weight decrements that applied.
    pub decrements: u64,
    /// Lowest score seen, if any decision has been scored.
    pub score_min: Option<i32>,
    /// Highest score seen, if any decision has been scored.
    pub score_max: Option<i32>,
    /// Accept decisions (L1 or binary accept).
    pub accepts: u64,
    /// Multi-level decisions sent to the L2.
    pub l2_accepts: u64,
    /// Reject decisions, including pending-table short circuits.
    pub rejects: u64,

    score_histogram: Vec<u64>,
    score_bucket: i32,
    score_span: i32,
    touched: Vec<Vec<bool>>,
    unique: Vec<u64>,
}

impl FilterStats {
    /// Creates zeroed counters for a filter with `slots` weight tables of
    /// `table_size` entries saturating at `max_weight`.
    pub fn new(slots: usize, table_size: usize, max_weight: i32) -> Self {
        let span = max_weight.saturating_mul(slots as i32);
        Self {
            accept_table_hits: 0,
            reject_table_hits: 0,
            accept_triggers: 0,
            reject_triggers: 0,
            eviction_updates: 0,
            increments: 0,
            decrements: 0,
            score_min: None,
            score_max: None,
            accepts: 0,
            l2_accepts: 0,
            rejects: 0,
            score_histogram: vec![0; slots * 2],
            score_bucket: max_weight,
            score_span: span,
            touched: vec![vec![false; table_size]; slots],
            unique: vec![0; slots],
        }
    }

    /// Folds a computed score into min/max and the score histogram.
    pub(crate) fn record_score(&mut self, score: i32) {
        self.score_min = Some(self.score_min.map_or(score, |min| min.min(score)));
        self.score_max = Some(self.score_max.map_or(score, |max| max.max(score)));

        let last = self.score_histogram.len() - 1;
        let shifted = score.saturating_add(self.score_span).max(0);
        let bucket = (shifted / self.score_bucket) as usize;
        self.score_histogram[bucket.min(last)] += 1;
    }

    /// Marks weight `index` of `slot` as touched by a decision.
    pub(crate) fn record_index(&mut self, slot: usize, index: usize) {
        let seen = &mut self.touched[slot][index];
        if !*seen {
            *seen = true;
            self.unique[slot] += 1;
        }
    }

    /// Score histogram in buckets of `max_weight` over
    /// `[-max_weight * slots, max_weight * slots]`.
    pub fn score_histogram(&self) -> &[u64] {
        &self.score_histogram
    }

    /// Distinct weight indices touched per slot.
    pub fn unique_indices(&self) -> &[u64] {
        &self.unique
    }

    /// Total decisions taken.
    pub fn decisions(&self) -> u64 {
        self.accepts
            .saturating_add(self.l2_accepts)
            .saturating_add(self.rejects)
    }
}

impl fmt::Display for FilterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  decisions           {} (accept {}, l2 {}, reject {})",
            self.decisions(),
            self.accepts,
            self.l2_accepts,
            self.rejects
        )?;
        writeln!(
            f,
            "  pending hits        accept {}, reject {}",
            self.accept_table_hits, self.reject_table_hits
        )?;
        writeln!(
            f,
            "  outcome triggers    accept {}, reject {}",
            self.accept_triggers, self.reject_triggers
        )?;
        writeln!(f, "  eviction updates    {}", self.eviction_updates)?;
        writeln!(
            f,
            "  weight updates      +{} / -{}",
            self.increments, self.decrements
        )?;
        match (self.score_min, self.score_max) {
            (Some(min), Some(max)) => writeln!(f, "  score range         [{min}, {max}]")?,
            _ => writeln!(f, "  score range         n/a")?,
        }
        write!(f, "  score histogram    ")?;
        for count in &self.score_histogram {
            write!(f, " {count}")?;
        }
        writeln!(f)?;
        write!(f, "  unique indices     ")?;
        for count in &self.unique {
            write!(f, " {count}")?;
        }
        writeln!(f)
    }
}
