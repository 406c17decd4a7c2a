//! Hybrid prefetcher driver.
//!
//! Wires the host's L1-I prefetcher callbacks to the sub-predictors, the
//! arbiter and one learned filter per predictor. Per cycle the host calls, in
//! order, [`on_branch`](HybridPrefetcher::on_branch) for each resolved branch,
//! [`on_access`](HybridPrefetcher::on_access) for each demand access,
//! [`on_cycle`](HybridPrefetcher::on_cycle) once, and
//! [`on_fill`](HybridPrefetcher::on_fill) for each completed fill.
//!
//! Besides the main shadow cache the driver keeps a baseline view that only
//! sees demand traffic and one view per predictor that additionally sees
//! everything that predictor proposed. Comparing them on a demand miss
//! tells the arbiter which predictors failed to warm a line.

use std::fmt::{self, Write as _};

use tracing::{info, trace};

use crate::arbiter::{Candidate, FillLevel, PrefetchArbiter};
use crate::cache::{CacheProbe, ShadowCache};
use crate::common::data::BranchKind;
use crate::common::error::ConfigError;
use crate::config::{Config, FilterMode};
use crate::filter::{Decision, FEATURE_COUNT, FeatureHistory, FilterLevel, Ppf};
use crate::predictor::{self, PrefetchSink, SubPredictor};

/// A prefetch the host should issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuedPrefetch {
    /// Address to fetch.
    pub address: u64,
    /// Predictor that won the candidate.
    pub predictor_id: usize,
    /// Cache level to fill.
    pub fill_level: FillLevel,
    /// Every predictor that proposed the block this cycle.
    pub overlap_mask: u32,
    /// Cycle the candidate was proposed in.
    pub timestamp: u64,
    /// Producer-defined source tag.
    pub source_entity: i64,
}

impl IssuedPrefetch {
    fn from_candidate(candidate: &Candidate, fill_level: FillLevel) -> Self {
        Self {
            address: candidate.pf_address,
            predictor_id: candidate.predictor_id,
            fill_level,
            overlap_mask: candidate.overlap_mask,
            timestamp: candidate.timestamp,
            source_entity: candidate.source_entity,
        }
    }
}

/// Per-predictor issue counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueCounts {
    /// Issued into the L1.
    pub l1: u64,
    /// Issued into the L2.
    pub l2: u64,
    /// Rejected by the filter.
    pub filtered: u64,
}

/// Learned-filter hybrid of several L1-I sub-predictors.
pub struct HybridPrefetcher {
    predictors: Vec<Box<dyn SubPredictor>>,
    sinks: Vec<PrefetchSink>,
    filters: Vec<Ppf>,
    arbiter: PrefetchArbiter,
    history: FeatureHistory,

    shadow: ShadowCache,
    baseline: ShadowCache,
    snapshots: Vec<ShadowCache>,

    filter_mode: FilterMode,
    metrics: bool,
    cycle: u64,
    issued: Vec<IssueCounts>,
    hit_scenarios: Vec<u64>,
}

impl fmt::Debug for HybridPrefetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.predictors.iter().map(|p| p.name()).collect();
        f.debug_struct("HybridPrefetcher")
            .field("predictors", &names)
            .field("filter_mode", &self.filter_mode)
            .field("metrics", &self.metrics)
            .field("cycle", &self.cycle)
            .field("arbiter", &self.arbiter)
            .finish_non_exhaustive()
    }
}

impl HybridPrefetcher {
    /// Builds the reference predictors named by `config` and wires them up.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let predictors = config.hybrid.predictors.iter().map(predictor::build).collect();
        Self::with_predictors(config, predictors)
    }

    /// Wires externally supplied predictors, one per configured slot.
    ///
    /// Slot `i` of the configuration provides the filter parameters of
    /// `predictors[i]`; its kind, degree and table size are ignored.
    pub fn with_predictors(
        config: &Config,
        predictors: Vec<Box<dyn SubPredictor>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let slots = &config.hybrid.predictors;
        if predictors.len() != slots.len() {
            return Err(ConfigError::PredictorCount {
                expected: slots.len(),
                found: predictors.len(),
            });
        }
        let n = predictors.len();
        info!(
            predictors = ?predictors.iter().map(|p| p.name()).collect::<Vec<_>>(),
            mode = ?config.hybrid.filter_mode,
            policy = ?config.arbiter.policy,
            "hybrid prefetcher configured"
        );

        Ok(Self {
            predictors,
            sinks: (0..n).map(PrefetchSink::new).collect(),
            filters: slots
                .iter()
                .enumerate()
                .map(|(id, slot)| Ppf::new(id, FEATURE_COUNT, &slot.filter))
                .collect(),
            arbiter: PrefetchArbiter::new(n, &config.arbiter),
            history: FeatureHistory::new(),
            shadow: ShadowCache::new(&config.cache),
            baseline: ShadowCache::new(&config.cache),
            snapshots: (0..n).map(|_| ShadowCache::new(&config.cache)).collect(),
            filter_mode: config.hybrid.filter_mode,
            metrics: config.hybrid.metrics,
            cycle: 0,
            issued: vec![IssueCounts::default(); n],
            hit_scenarios: vec![0; 1 << (n + 1)],
        })
    }

    /// Number of sub-predictors.
    pub fn predictors(&self) -> usize {
        self.predictors.len()
    }

    /// The arbiter.
    pub fn arbiter(&self) -> &PrefetchArbiter {
        &self.arbiter
    }

    /// Mutable access to the arbiter, e.g. to change the priority order.
    pub fn arbiter_mut(&mut self) -> &mut PrefetchArbiter {
        &mut self.arbiter
    }

    /// Filter of predictor `id`.
    pub fn filter(&self, id: usize) -> &Ppf {
        &self.filters[id]
    }

    /// Main shadow cache.
    pub fn shadow(&self) -> &ShadowCache {
        &self.shadow
    }

    /// Branch and fetch history the features are built from.
    pub fn history(&self) -> &FeatureHistory {
        &self.history
    }

    /// Issue counters of predictor `id`.
    pub fn issued(&self, id: usize) -> IssueCounts {
        self.issued[id]
    }

    /// Cycles seen so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Demand-access hit combinations of the what-if caches. Bit `i` is
    /// predictor `i`'s view, the top bit the baseline view.
    pub fn hit_scenarios(&self) -> &[u64] {
        &self.hit_scenarios
    }

    /// Initializes every sub-predictor.
    pub fn initialize(&mut self) {
        for predictor in &mut self.predictors {
            predictor.initialize();
        }
    }

    /// A branch resolved.
    pub fn on_branch(&mut self, ip: u64, kind: BranchKind, target: u64) {
        for predictor in &mut self.predictors {
            predictor.on_branch(ip, kind, target);
        }
        self.history.record_branch(kind, target);

        // Returns are delivered ahead of their demand access.
        if kind == BranchKind::Return {
            self.shadow.insert_as_demand(ip, 0);
        }
    }

    /// A demand access reached the L1-I.
    pub fn on_access(&mut self, address: u64, cache_hit: bool, prefetch_hit: bool) {
        for predictor in &mut self.predictors {
            predictor.on_access(address, cache_hit, prefetch_hit);
        }
        for filter in &mut self.filters {
            filter.observe(address, cache_hit);
        }
        self.history.record_access(address);

        let access = self.shadow.access(address);

        if self.metrics {
            self.arbiter
                .record_hit(address, access.hit, access.prefetch_hit);
            if !cache_hit {
                let predicted: Vec<bool> =
                    self.snapshots.iter().map(|s| s.contains(address)).collect();
                let baseline_hit = self.baseline.contains(address);
                self.arbiter.record_harm(address, baseline_hit, &predicted);
            }
            self.arbiter.record_accuracy(address, access.prefetch_hit);
            let _ = self.arbiter.advance_epoch();
        }

        let n = self.snapshots.len();
        let mut scenario = 0usize;
        for (id, snapshot) in self.snapshots.iter_mut().enumerate() {
            if snapshot.access(address).hit {
                scenario |= 1 << id;
            }
        }
        if self.baseline.access(address).hit {
            scenario |= 1 << n;
        }
        self.hit_scenarios[scenario] += 1;
    }

    /// Runs one cycle and returns the prefetches to issue, at most
    /// `target_count` of them.
    pub fn on_cycle(&mut self, target_count: usize) -> Vec<IssuedPrefetch> {
        self.cycle += 1;

        for (id, predictor) in self.predictors.iter_mut().enumerate() {
            let sink = &mut self.sinks[id];
            sink.set_cycle(self.cycle);
            predictor.on_cycle(sink);
            for candidate in sink.drain() {
                let _ = self.snapshots[id].insert_as_prefetch(candidate.pf_address);
                let _ = self.arbiter.enqueue(id, candidate);
            }
        }

        let selected = self.arbiter.select(target_count, &self.shadow);
        let mut issued = Vec::with_capacity(selected.len());

        for candidate in &selected {
            let level = self.gate(candidate);
            let id = candidate.predictor_id;
            match level {
                FilterLevel::L1 => self.issued[id].l1 += 1,
                FilterLevel::L2 => self.issued[id].l2 += 1,
                FilterLevel::Reject => self.issued[id].filtered += 1,
            }
            trace!(
                cycle = self.cycle,
                predictor = id,
                address = candidate.pf_address,
                ?level,
                "prefetch gated"
            );

            let fill_level = match level {
                FilterLevel::L1 => FillLevel::L1,
                FilterLevel::L2 => FillLevel::L2,
                FilterLevel::Reject => continue,
            };
            if fill_level == FillLevel::L1 {
                let _ = self.shadow.insert_as_prefetch(candidate.pf_address);
            }
            issued.push(IssuedPrefetch::from_candidate(candidate, fill_level));
        }
        issued
    }

    /// Applies the configured filter mode to one selected candidate.
    fn gate(&mut self, candidate: &Candidate) -> FilterLevel {
        let address = candidate.pf_address;
        let features = self.history.features(address);
        let id = candidate.predictor_id;

        let level = match self.filter_mode {
            FilterMode::Off => FilterLevel::L1,
            FilterMode::MultiLevel => {
                let level = self.filters[id].decide_level(address, features);
                self.history.record_prefetch(address);
                return level;
            }
            FilterMode::Binary => binary(self.filters[id].decide(address, features)),
            FilterMode::Merge if candidate.is_shared() => {
                let mut accepted = false;
                for proposer in candidate.proposers() {
                    let decision = self.filters[proposer].decide(address, features.clone());
                    accepted |= decision == Decision::Accept;
                }
                if accepted {
                    FilterLevel::L1
                } else {
                    FilterLevel::Reject
                }
            }
            FilterMode::Merge => binary(self.filters[id].decide(address, features)),
        };
        if level != FilterLevel::Reject {
            self.history.record_prefetch(address);
        }
        level
    }

    /// A line was filled into the L1-I.
    pub fn on_fill(&mut self, address: u64, evicted_address: u64, is_prefetch: bool) {
        for predictor in &mut self.predictors {
            predictor.on_fill(address, evicted_address, is_prefetch);
        }
        if !is_prefetch {
            self.shadow.insert_as_demand(address, evicted_address);
        }
    }

    /// End of run report of every component.
    pub fn final_report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Hybrid prefetcher ({:?}), {} cycles", self.filter_mode, self.cycle);
        for (id, predictor) in self.predictors.iter().enumerate() {
            let counts = self.issued[id];
            let _ = writeln!(
                out,
                "  [{id}] {:<10} l1 {:>10}  l2 {:>10}  filtered {:>10}",
                predictor.name(),
                counts.l1,
                counts.l2,
                counts.filtered
            );
            let report = predictor.final_report();
            if !report.is_empty() {
                let _ = writeln!(out, "       {report}");
            }
        }
        let _ = writeln!(out, "  what-if hit scenarios (baseline bit first)");
        let width = self.snapshots.len() + 1;
        for (mask, &count) in self.hit_scenarios.iter().enumerate() {
            if count > 0 {
                let _ = writeln!(out, "    {mask:0width$b}  {count}");
            }
        }
        let _ = write!(out, "{}", self.arbiter);
        if self.filter_mode != FilterMode::Off {
            for filter in &self.filters {
                let _ = write!(out, "{filter}");
            }
        }
        out
    }
}

const fn binary(decision: Decision) -> FilterLevel {
    match decision {
        Decision::Accept => FilterLevel::L1,
        Decision::Reject => FilterLevel::Reject,
    }
}
