use std::collections::VecDeque;

use hybridpf_core::predictor::{PrefetchSink, SubPredictor};

/// Sub-predictor that emits a fixed list of addresses per cycle.
///
/// Each call to `on_cycle` proposes the next batch; once the script is
/// exhausted it proposes nothing.
#[derive(Debug, Default)]
pub struct ScriptedPredictor {
    batches: VecDeque<Vec<u64>>,
    /// Demand accesses seen through `on_access`.
    pub accesses: Vec<u64>,
}

impl ScriptedPredictor {
    /// Creates a predictor that proposes `batches[i]` on its `i`th cycle.
    pub fn new(batches: Vec<Vec<u64>>) -> Self {
        Self {
            batches: batches.into(),
            accesses: Vec::new(),
        }
    }

    /// Boxed, ready for `HybridPrefetcher::with_predictors`.
    pub fn boxed(batches: Vec<Vec<u64>>) -> Box<dyn SubPredictor> {
        Box::new(Self::new(batches))
    }
}

impl SubPredictor for ScriptedPredictor {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn on_access(&mut self, address: u64, _cache_hit: bool, _prefetch_hit: bool) {
        self.accesses.push(address);
    }

    fn on_cycle(&mut self, sink: &mut PrefetchSink) {
        let Some(batch) = self.batches.pop_front() else {
            return;
        };
        for address in batch {
            sink.prefetch(0, 0, address);
        }
    }
}
