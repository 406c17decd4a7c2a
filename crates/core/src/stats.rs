//! Replay statistics collection and reporting.
//!
//! Tracks the demand side of the modelled L1-I and the prefetches the hybrid
//! issued:
//! 1. **Fetches:** Demand accesses, hits, misses and prefetch hits.
//! 2. **Prefetches:** Issued prefetches by fill level and useful prefetches.
//! 3. **Branches:** Resolved branches replayed.

use std::fmt;
use std::time::{Duration, Instant};

/// Replay statistics.
#[derive(Debug, Clone)]
pub struct ReplayStats {
    start_time: Instant,
    elapsed: Option<Duration>,

    /// Replayed fetch events.
    pub fetches: u64,
    /// Fetches that hit the modelled L1-I.
    pub hits: u64,
    /// Fetches that missed.
    pub misses: u64,
    /// Hits on a prefetched line not yet used by a demand access.
    pub prefetch_hits: u64,

    /// Replayed branch events.
    pub branches: u64,

    /// Prefetches issued into the L1.
    pub issued_l1: u64,
    /// Prefetches issued into the L2.
    pub issued_l2: u64,
    /// L1 prefetches dropped because the block was already resident.
    pub redundant: u64,
}

impl Default for ReplayStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            elapsed: None,
            fetches: 0,
            hits: 0,
            misses: 0,
            prefetch_hits: 0,
            branches: 0,
            issued_l1: 0,
            issued_l2: 0,
            redundant: 0,
        }
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl ReplayStats {
    /// Freezes the wall-clock duration.
    pub fn finish(&mut self) {
        self.elapsed = Some(self.start_time.elapsed());
    }

    /// Fraction of fetches that hit.
    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits, self.fetches)
    }

    /// Fraction of L1 prefetches later hit by a demand access.
    pub fn prefetch_accuracy(&self) -> f64 {
        ratio(self.prefetch_hits, self.issued_l1)
    }

    /// Misses per thousand fetches.
    pub fn mpki(&self) -> f64 {
        ratio(self.misses * 1000, self.fetches)
    }
}

impl fmt::Display for ReplayStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elapsed = self.elapsed.unwrap_or_else(|| self.start_time.elapsed());
        writeln!(f, "==========================================================")?;
        writeln!(f, "REPLAY STATISTICS")?;
        writeln!(f, "----------------------------------------------------------")?;
        writeln!(f, "  fetches            {:>12}", self.fetches)?;
        writeln!(
            f,
            "  hits               {:>12}  ({:.2}%)",
            self.hits,
            self.hit_rate() * 100.0
        )?;
        writeln!(f, "  misses             {:>12}  ({:.2} per 1k)", self.misses, self.mpki())?;
        writeln!(f, "  prefetch hits      {:>12}", self.prefetch_hits)?;
        writeln!(f, "  branches           {:>12}", self.branches)?;
        writeln!(f, "  issued L1          {:>12}", self.issued_l1)?;
        writeln!(f, "  issued L2          {:>12}", self.issued_l2)?;
        writeln!(f, "  redundant          {:>12}", self.redundant)?;
        writeln!(
            f,
            "  prefetch accuracy  {:>11.2}%",
            self.prefetch_accuracy() * 100.0
        )?;
        writeln!(f, "  wall time          {:>12.3?}", elapsed)?;
        writeln!(f, "==========================================================")
    }
}
