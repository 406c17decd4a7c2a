//! # Candidate and Queue Tests

use hybridpf_core::arbiter::{Candidate, FillLevel, PredictorQueue};
use pretty_assertions::assert_eq;

use crate::common::{addr, candidate};

/// A new candidate is proposed by its own predictor only.
#[test]
fn test_new_candidate_defaults() {
    let c = Candidate::new(3, 0x1234_5678);
    assert_eq!(c.overlap_mask, 0b1000);
    assert_eq!(c.page, 0x1_2345);
    assert_eq!(c.fill_level, FillLevel::L1);
    assert_eq!(c.source_entity, -1);
    assert!(c.valid);
    assert!(!c.is_shared());
}

/// Builders fill the optional fields.
#[test]
fn test_candidate_builders() {
    let c = Candidate::new(0, 0x2000)
        .with_origin(0x400)
        .with_base(0x1fc0)
        .with_fill_level(FillLevel::L2)
        .with_timestamp(9)
        .with_source_entity(4);
    assert_eq!(
        (c.origin_ip, c.base_address, c.fill_level, c.timestamp, c.source_entity),
        (0x400, 0x1fc0, FillLevel::L2, 9, 4)
    );
}

/// Equality looks at the target block only.
#[test]
fn test_equality_by_block() {
    let a = Candidate::new(0, 0x2000).with_timestamp(1);
    let b = Candidate::new(2, 0x203f)
        .with_fill_level(FillLevel::L2)
        .with_timestamp(7);
    assert!(a == b);
    assert!(a.same_block(&b));
    assert!(a != Candidate::new(0, 0x2040).with_timestamp(1));
}

/// Overlap bits accumulate and list every proposer.
#[test]
fn test_overlap_mask() {
    let mut c = candidate(1, 10);
    c.add_overlap(4);
    c.add_overlap(1);
    assert!(c.is_shared());
    assert!(c.proposed_by(4));
    assert!(!c.proposed_by(0));
    assert_eq!(c.proposers().collect::<Vec<_>>(), vec![1, 4]);
    assert!(c.same_block(&Candidate::new(0, addr(10) + 12)));
}

/// Predictor ids beyond the mask width are rejected.
#[test]
#[should_panic(expected = "out of range")]
fn test_candidate_id_out_of_range() {
    let _ = Candidate::new(8, 0x1000);
}

/// A full queue drops new candidates and counts them.
#[test]
fn test_queue_overflow_drops_newest() {
    let mut queue = PredictorQueue::new(2);
    assert!(queue.push(candidate(0, 1)));
    assert!(queue.push(candidate(0, 2)));
    assert!(!queue.push(candidate(0, 3)));

    assert_eq!(queue.len(), 2);
    assert_eq!(queue.dropped(), 1);
    assert_eq!(queue.front().map(Candidate::block), Some(1));
}

/// The queue is FIFO and searchable by block.
#[test]
fn test_queue_fifo_and_find() {
    let mut queue = PredictorQueue::new(4);
    for blk in [5, 6, 7] {
        let _ = queue.push(candidate(0, blk));
    }
    assert!(queue.find_block(6).is_some());
    assert!(queue.find_block(8).is_none());
    assert_eq!(queue.pop().map(|c| c.block()), Some(5));
    assert_eq!(queue.iter().map(Candidate::block).collect::<Vec<_>>(), vec![6, 7]);
}

/// Purging removes matching blocks and keeps the rest in order.
#[test]
fn test_queue_purge() {
    let mut queue = PredictorQueue::new(8);
    for blk in [1, 2, 3, 4] {
        let _ = queue.push(candidate(0, blk));
    }
    assert_eq!(queue.purge(|blk| blk % 2 == 0), 2);
    assert_eq!(queue.iter().map(Candidate::block).collect::<Vec<_>>(), vec![1, 3]);
}
