//! # Tracking Table Tests
//!
//! Direct-mapped pending-decision storage: block matching, eviction hand
//! off and removal.

use hybridpf_core::filter::tracking::slot_hash;
use hybridpf_core::filter::{Evicted, TrackingTable};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

proptest! {
    /// Slot selection always lands inside the table.
    #[test]
    fn prop_slot_hash_in_range(value in any::<u64>(), limit in 1usize..4096) {
        prop_assert!(slot_hash(value, limit) < limit);
    }
}

/// Lookups match on the block, not the byte address.
#[test]
fn test_contains_matches_block() {
    let mut table = TrackingTable::new(16);
    assert_eq!(table.insert(0x1000, vec![1, 2]), None);
    assert!(table.contains(0x1000));
    assert!(table.contains(0x103f));
    assert!(!table.contains(0x1040));
    assert_eq!(table.features(0x1008), Some(&[1u64, 2][..]));
}

/// A conflicting insert hands back the displaced entry unchanged.
#[test]
fn test_conflicting_insert_returns_evicted_entry() {
    let mut table = TrackingTable::new(1);
    assert_eq!(table.insert(0x1004, vec![7, 8, 9]), None);

    let evicted = table.insert(0x2000, vec![1]);
    assert_eq!(
        evicted,
        Some(Evicted {
            address: 0x1004,
            features: vec![7, 8, 9],
        })
    );
    assert!(!table.contains(0x1000));
    assert!(table.contains(0x2000));
    assert_eq!(table.len(), 1);
}

/// Removal returns the entry once and frees the slot.
#[test]
fn test_remove_frees_slot() {
    let mut table = TrackingTable::new(4);
    let _ = table.insert(0x4000, vec![3]);
    assert_eq!(table.len(), 1);

    let removed = table.remove(0x4010);
    assert_eq!(removed.map(|e| e.features), Some(vec![3]));
    assert!(table.is_empty());
    assert_eq!(table.remove(0x4000), None);
}

/// Removing an untracked block leaves a conflicting occupant alone.
#[test]
fn test_remove_other_block_is_noop() {
    let mut table = TrackingTable::new(1);
    let _ = table.insert(0x4000, vec![3]);
    assert_eq!(table.remove(0x8000), None);
    assert!(table.contains(0x4000));
}

/// Inserting a block that is already pending is a caller bug.
#[test]
#[should_panic(expected = "already tracked")]
fn test_double_insert_panics() {
    let mut table = TrackingTable::new(8);
    let _ = table.insert(0x1000, vec![1]);
    let _ = table.insert(0x1020, vec![2]);
}
