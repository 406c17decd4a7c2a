//! Sub-predictor interface and reference implementations.
//!
//! The hybrid driver holds an ordered list of sub-predictors and fans every
//! host event out to each of them. A predictor never talks to the arbiter
//! directly: during [`SubPredictor::on_cycle`] it stages proposals in its
//! [`PrefetchSink`], which the driver then moves into the predictor's queue.

/// Next-line predictor.
pub mod next_line;

/// Per-page block-stride predictor.
pub mod stride;

use crate::arbiter::Candidate;
use crate::common::data::BranchKind;
use crate::config::{PredictorConfig, PredictorKind};

pub use self::next_line::NextLinePredictor;
pub use self::stride::StridePredictor;

/// Host event hooks of one sub-predictor.
pub trait SubPredictor: Send {
    /// Short name used in reports.
    fn name(&self) -> &'static str;

    /// Called once before the first event.
    fn initialize(&mut self) {}

    /// A branch resolved.
    fn on_branch(&mut self, _ip: u64, _kind: BranchKind, _target: u64) {}

    /// A demand access reached the instruction cache.
    fn on_access(&mut self, address: u64, cache_hit: bool, prefetch_hit: bool);

    /// Stages this cycle's proposals.
    fn on_cycle(&mut self, sink: &mut PrefetchSink);

    /// A line was filled into the instruction cache.
    fn on_fill(&mut self, _address: u64, _evicted_address: u64, _is_prefetch: bool) {}

    /// End of run report.
    fn final_report(&self) -> String {
        String::new()
    }
}

/// Staging area for the proposals of one predictor in one cycle.
#[derive(Debug, Clone)]
pub struct PrefetchSink {
    id: usize,
    cycle: u64,
    staged: Vec<Candidate>,
}

impl PrefetchSink {
    /// Creates an empty sink for predictor `id`.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            cycle: 0,
            staged: Vec::new(),
        }
    }

    /// Predictor the sink stages for.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Cycle the staged proposals are stamped with.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub(crate) fn set_cycle(&mut self, cycle: u64) {
        self.cycle = cycle;
    }

    /// Stages a prefetch of `pf_address` triggered by an access to
    /// `base_address` at instruction `ip`.
    pub fn prefetch(&mut self, ip: u64, base_address: u64, pf_address: u64) {
        let candidate = Candidate::new(self.id, pf_address)
            .with_origin(ip)
            .with_base(base_address)
            .with_timestamp(self.cycle);
        self.staged.push(candidate);
    }

    /// Stages a fully built candidate.
    pub fn push(&mut self, candidate: Candidate) {
        self.staged.push(candidate);
    }

    /// Staged proposals.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Returns `true` if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Takes every staged proposal, oldest first.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Candidate> {
        self.staged.drain(..)
    }
}

/// Builds the reference predictor a slot describes.
pub fn build(config: &PredictorConfig) -> Box<dyn SubPredictor> {
    match config.kind {
        PredictorKind::NextLine => Box::new(NextLinePredictor::new(config.degree)),
        PredictorKind::Stride => Box::new(StridePredictor::new(config.table_size, config.degree)),
    }
}
