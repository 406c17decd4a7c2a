//! Trace replay against a modelled L1-I.
//!
//! The harness plays the host: every fetch is looked up in a [`ShadowCache`]
//! standing in for the real L1-I, reported to the hybrid as a demand access,
//! followed by one prefetcher cycle. L1 prefetches are installed immediately
//! and reported as prefetch fills; demand misses are reported as demand
//! fills after the cycle.

use tracing::{debug, info};

use super::trace::TraceEvent;
use crate::arbiter::FillLevel;
use crate::cache::{CacheProbe, ShadowCache};
use crate::common::error::ConfigError;
use crate::config::Config;
use crate::hybrid::HybridPrefetcher;
use crate::stats::ReplayStats;

/// Host model driving a [`HybridPrefetcher`].
#[derive(Debug)]
pub struct Replay {
    hybrid: HybridPrefetcher,
    l1i: ShadowCache,
    slots: usize,
    stats: ReplayStats,
}

impl Replay {
    /// Builds the hybrid and an L1-I model of the configured geometry.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let hybrid = HybridPrefetcher::new(config)?;
        Ok(Self::with_hybrid(
            hybrid,
            ShadowCache::new(&config.cache),
            config.hybrid.prefetch_slots,
        ))
    }

    /// Drives an already built hybrid against `l1i`, offering `slots`
    /// prefetch slots per cycle.
    pub fn with_hybrid(mut hybrid: HybridPrefetcher, l1i: ShadowCache, slots: usize) -> Self {
        hybrid.initialize();
        Self {
            hybrid,
            l1i,
            slots,
            stats: ReplayStats::default(),
        }
    }

    /// The driven hybrid.
    pub fn hybrid(&self) -> &HybridPrefetcher {
        &self.hybrid
    }

    /// The modelled L1-I.
    pub fn cache(&self) -> &ShadowCache {
        &self.l1i
    }

    /// Statistics so far.
    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }

    /// Replays one event.
    pub fn step(&mut self, event: &TraceEvent) {
        match *event {
            TraceEvent::Branch { ip, kind, target } => {
                self.stats.branches += 1;
                self.hybrid.on_branch(ip, kind, target);
            }
            TraceEvent::Fetch { address } => self.fetch(address),
        }
    }

    fn fetch(&mut self, address: u64) {
        let access = self.l1i.access(address);
        self.stats.fetches += 1;
        if access.hit {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        if access.prefetch_hit {
            self.stats.prefetch_hits += 1;
        }

        self.hybrid
            .on_access(address, access.hit, access.prefetch_hit);

        for prefetch in self.hybrid.on_cycle(self.slots) {
            match prefetch.fill_level {
                FillLevel::L1 if self.l1i.contains(prefetch.address) => {
                    self.stats.redundant += 1;
                }
                FillLevel::L1 => {
                    let evicted = self.l1i.insert_as_prefetch(prefetch.address);
                    self.stats.issued_l1 += 1;
                    self.hybrid
                        .on_fill(prefetch.address, evicted.unwrap_or(0), true);
                }
                FillLevel::L2 => self.stats.issued_l2 += 1,
            }
        }

        if !access.hit {
            self.hybrid
                .on_fill(address, access.evicted.unwrap_or(0), false);
        }
    }

    /// Replays every event and freezes the statistics.
    pub fn run(&mut self, events: &[TraceEvent]) -> &ReplayStats {
        info!(events = events.len(), "replay started");
        for (idx, event) in events.iter().enumerate() {
            self.step(event);
            if (idx + 1) % 1_000_000 == 0 {
                debug!(events = idx + 1, "replay progress");
            }
        }
        self.stats.finish();
        info!(
            fetches = self.stats.fetches,
            misses = self.stats.misses,
            prefetch_hits = self.stats.prefetch_hits,
            "replay finished"
        );
        &self.stats
    }

    /// Replay statistics followed by the hybrid's end of run report.
    pub fn report(&self) -> String {
        format!("{}\n{}", self.stats, self.hybrid.final_report())
    }
}
