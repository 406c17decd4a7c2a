//! Next-Line predictor.
//!
//! Proposes the `degree` blocks following every demand access. Instruction
//! streams are mostly sequential between taken branches, so this is the
//! baseline every other predictor has to beat.

use super::{PrefetchSink, SubPredictor};
use crate::common::addr::block_base;
use crate::common::constants::BLOCK_SIZE;

/// Next-Line predictor state.
#[derive(Debug, Clone)]
pub struct NextLinePredictor {
    degree: usize,
    pending: Option<u64>,
    proposed: u64,
}

impl NextLinePredictor {
    /// Creates a predictor proposing `degree` blocks ahead (at least one).
    pub fn new(degree: usize) -> Self {
        Self {
            degree: degree.max(1),
            pending: None,
            proposed: 0,
        }
    }

    /// Prefetch degree.
    pub fn degree(&self) -> usize {
        self.degree
    }
}

impl SubPredictor for NextLinePredictor {
    fn name(&self) -> &'static str {
        "next_line"
    }

    fn on_access(&mut self, address: u64, _cache_hit: bool, _prefetch_hit: bool) {
        self.pending = Some(address);
    }

    fn on_cycle(&mut self, sink: &mut PrefetchSink) {
        let Some(address) = self.pending.take() else {
            return;
        };
        let base = block_base(address);
        for k in 1..=self.degree as u64 {
            sink.prefetch(address, address, base.wrapping_add(BLOCK_SIZE * k));
            self.proposed += 1;
        }
    }

    fn final_report(&self) -> String {
        format!("next_line: degree {}, proposed {}", self.degree, self.proposed)
    }
}
