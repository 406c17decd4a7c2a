//! # Round-Robin Arbitration Tests
//!
//! Deduplication, probe filtering, quotas and priority order of the
//! round-robin policy, plus the selection bounds shared with voting.

use std::collections::HashSet;

use hybridpf_core::arbiter::{Candidate, PrefetchArbiter};
use hybridpf_core::cache::NullProbe;
use hybridpf_core::config::{ArbiterConfig, ArbitrationPolicy};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::mocks::cache::resident_blocks;
use crate::common::{addr, approx_eq, arbiter_config, candidate};

fn round_robin(predictors: usize, quotas: bool) -> PrefetchArbiter {
    PrefetchArbiter::new(
        predictors,
        &arbiter_config(ArbitrationPolicy::RoundRobin, quotas),
    )
}

fn fill(arbiter: &mut PrefetchArbiter, id: usize, blocks: &[u64]) {
    for &blk in blocks {
        let _ = arbiter.enqueue(id, candidate(id, blk));
    }
}

fn blocks(selected: &[Candidate]) -> Vec<u64> {
    selected.iter().map(Candidate::block).collect()
}

// ══════════════════════════════════════════════════════════
// 1. Selection
// ══════════════════════════════════════════════════════════

/// A block proposed by two predictors is issued once, credited to both.
#[test]
fn test_shared_block_merged() {
    let mut arbiter = round_robin(2, false);
    fill(&mut arbiter, 0, &[1, 2]);
    fill(&mut arbiter, 1, &[1, 3]);

    let selected = arbiter.select(3, &NullProbe);
    assert_eq!(blocks(&selected), vec![1, 2, 3]);
    assert_eq!(selected[0].overlap_mask, 0b11);
    assert_eq!(selected[0].predictor_id, 0);
    assert_eq!(selected[1].overlap_mask, 0b01);
    assert_eq!(selected[2].overlap_mask, 0b10);
    assert_eq!(arbiter.queued_total(), 0);
}

/// Candidates the cache already holds are dropped from their queue.
#[test]
fn test_resident_blocks_dropped() {
    let mut arbiter = round_robin(2, false);
    fill(&mut arbiter, 0, &[1, 2]);
    fill(&mut arbiter, 1, &[3]);

    let probe = resident_blocks(&[2]);
    let selected = arbiter.select(4, &probe);
    assert_eq!(blocks(&selected), vec![1, 3]);
    assert!(arbiter.queue(0).is_empty());
}

/// The budget stops selection and leaves the rest queued.
#[test]
fn test_target_count_limits_output() {
    let mut arbiter = round_robin(2, false);
    fill(&mut arbiter, 0, &[1, 2, 3]);
    fill(&mut arbiter, 1, &[4, 5]);

    let selected = arbiter.select(3, &NullProbe);
    assert_eq!(blocks(&selected), vec![1, 4, 2]);
    assert_eq!(arbiter.queued_total(), 2);
}

/// A zero budget or empty queues select nothing.
#[test]
fn test_empty_selection() {
    let mut arbiter = round_robin(2, false);
    assert!(arbiter.select(4, &NullProbe).is_empty());
    assert!(arbiter.scenarios().iter().all(|&n| n == 0));

    fill(&mut arbiter, 0, &[1]);
    assert!(arbiter.select(0, &NullProbe).is_empty());
    assert_eq!(arbiter.queued_total(), 1);
}

/// Each call records which queues had work.
#[test]
fn test_scenarios_histogram() {
    let mut arbiter = round_robin(2, false);
    fill(&mut arbiter, 1, &[7]);
    let _ = arbiter.select(1, &NullProbe);
    assert_eq!(arbiter.scenarios().len(), 4);
    assert_eq!(arbiter.scenarios()[0b10], 1);
}

/// Sent prefetches are charged to the admitting predictor only.
#[test]
fn test_selection_records_sent() {
    let mut arbiter = round_robin(2, false);
    fill(&mut arbiter, 0, &[1]);
    fill(&mut arbiter, 1, &[1]);
    let _ = arbiter.select(2, &NullProbe);
    assert_eq!(arbiter.metrics().predictor(0).sent, 1);
    assert_eq!(arbiter.metrics().predictor(1).sent, 0);
}

// ══════════════════════════════════════════════════════════
// 2. Queues
// ══════════════════════════════════════════════════════════

/// Enqueue stamps the queue's predictor onto the candidate.
#[test]
fn test_enqueue_resets_ownership() {
    let mut arbiter = round_robin(2, false);
    assert!(arbiter.enqueue(1, Candidate::new(0, addr(4))));
    let front = arbiter.queue(1).front().cloned();
    assert_eq!(front.map(|c| (c.predictor_id, c.overlap_mask)), Some((1, 0b10)));
}

/// Overflowing a queue drops the candidate.
#[test]
fn test_enqueue_overflow() {
    let config = ArbiterConfig {
        queue_capacity: 2,
        ..ArbiterConfig::default()
    };
    let mut arbiter = PrefetchArbiter::new(1, &config);
    assert!(arbiter.enqueue(0, candidate(0, 1)));
    assert!(arbiter.enqueue(0, candidate(0, 2)));
    assert!(!arbiter.enqueue(0, candidate(0, 3)));
    assert_eq!(arbiter.queue(0).dropped(), 1);
}

/// Unknown predictor ids are contract violations.
#[test]
#[should_panic(expected = "unknown predictor id")]
fn test_enqueue_unknown_predictor() {
    let mut arbiter = round_robin(2, false);
    let _ = arbiter.enqueue(2, candidate(2, 1));
}

/// The predictor count must fit the overlap mask.
#[test]
#[should_panic(expected = "predictors")]
fn test_too_many_predictors() {
    let _ = round_robin(9, false);
}

// ══════════════════════════════════════════════════════════
// 3. Quotas
// ══════════════════════════════════════════════════════════

/// Without metric evidence every predictor gets the floor of one.
#[test]
fn test_quota_floor_limits_rounds() {
    let mut arbiter = round_robin(2, true);
    fill(&mut arbiter, 0, &[1, 2]);
    fill(&mut arbiter, 1, &[3, 4]);
    assert_eq!(arbiter.allocate(), vec![1, 1]);

    let selected = arbiter.select(4, &NullProbe);
    assert_eq!(blocks(&selected), vec![1, 3]);
    assert_eq!(arbiter.queued_total(), 2);
}

/// Quotas are ignored unless enabled.
#[test]
fn test_quota_disabled_drains_queues() {
    let mut arbiter = round_robin(2, false);
    fill(&mut arbiter, 0, &[1, 2]);
    fill(&mut arbiter, 1, &[3, 4]);
    assert_eq!(arbiter.select(4, &NullProbe).len(), 4);
}

/// An accurate, covering, harmless predictor may drain its whole queue.
#[test]
fn test_quota_scales_with_metrics() {
    let mut arbiter = round_robin(2, true);
    fill(&mut arbiter, 0, &[1]);
    let _ = arbiter.select(1, &NullProbe);
    arbiter.record_hit(addr(1), true, true);

    fill(&mut arbiter, 0, &[2, 3, 4]);
    assert!(approx_eq(arbiter.metrics().accuracy(0), 1.0));
    assert!(approx_eq(arbiter.metrics().coverage(0), 1.0));
    assert_eq!(arbiter.allocate(), vec![4, 1]);
}

// ══════════════════════════════════════════════════════════
// 4. Priority Order
// ══════════════════════════════════════════════════════════

/// Promoting a predictor gives it the first turn.
#[test]
fn test_promote_changes_turn_order() {
    let mut arbiter = round_robin(3, false);
    arbiter.promote(2);
    assert_eq!(arbiter.order(), &[2, 0, 1]);

    fill(&mut arbiter, 0, &[1]);
    fill(&mut arbiter, 2, &[3]);
    assert_eq!(blocks(&arbiter.select(2, &NullProbe)), vec![3, 1]);
}

/// Reorder replaces the order wholesale.
#[test]
fn test_reorder() {
    let mut arbiter = round_robin(3, false);
    arbiter.reorder(&[1, 2, 0]);
    assert_eq!(arbiter.order(), &[1, 2, 0]);
}

/// Orders that are not permutations are rejected.
#[test]
#[should_panic(expected = "not a permutation")]
fn test_reorder_rejects_duplicates() {
    let mut arbiter = round_robin(2, false);
    arbiter.reorder(&[0, 0]);
}

/// Promoting an unknown predictor is rejected.
#[test]
#[should_panic(expected = "unknown predictor id")]
fn test_promote_unknown() {
    let mut arbiter = round_robin(2, false);
    arbiter.promote(5);
}

// ══════════════════════════════════════════════════════════
// 5. Selection Bounds
// ══════════════════════════════════════════════════════════

proptest! {
    /// Under both policies the output respects the budget, never exceeds
    /// what was queued, never repeats a block, and credits the admitting
    /// predictor in the overlap mask.
    #[test]
    fn prop_selection_bounds(
        voting in prop::bool::ANY,
        proposals in prop::collection::vec((0usize..3, 0u64..16), 0..48),
        target in 0usize..10,
    ) {
        let policy = if voting { ArbitrationPolicy::Voting } else { ArbitrationPolicy::RoundRobin };
        let mut arbiter = PrefetchArbiter::new(3, &arbiter_config(policy, false));
        for (id, blk) in proposals {
            let _ = arbiter.enqueue(id, candidate(id, blk));
        }
        let queued = arbiter.queued_total();

        let selected = arbiter.select(target, &NullProbe);
        prop_assert!(selected.len() <= target);
        prop_assert!(selected.len() <= queued);

        let unique: HashSet<u64> = selected.iter().map(Candidate::block).collect();
        prop_assert_eq!(unique.len(), selected.len());
        for c in &selected {
            prop_assert!(c.proposed_by(c.predictor_id));
        }
    }
}
