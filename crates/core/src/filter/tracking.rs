//! Tracking tables for pending filter decisions.
//!
//! A direct-mapped table indexed by a mixed hash of the block number. Each
//! slot holds at most one entry and there is no chaining: inserting a
//! different block into an occupied slot evicts the resident entry and hands
//! it back so the filter can train on it.

use crate::common::addr::block;

/// Mixes a block number before the modulo so neighbouring blocks spread
/// across slots.
///
/// # Panics
///
/// Panics if `limit` is zero.
#[inline]
pub fn slot_hash(value: u64, limit: usize) -> usize {
    assert!(limit != 0, "tracking hash called with a zero modulus");
    let mut hash = value;
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash = hash.wrapping_add(hash << 15);
    (hash % limit as u64) as usize
}

/// Entry handed back on eviction or removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evicted {
    /// Full address the entry was created with.
    pub address: u64,
    /// Feature vector the decision was scored with.
    pub features: Vec<u64>,
}

#[derive(Debug, Clone, Default)]
struct TrackingEntry {
    valid: bool,
    address: u64,
    features: Vec<u64>,
}

impl TrackingEntry {
    #[inline]
    fn holds(&self, address: u64) -> bool {
        self.valid && block(self.address) == block(address)
    }
}

/// Direct-mapped store of pending decisions.
#[derive(Debug, Clone)]
pub struct TrackingTable {
    entries: Vec<TrackingEntry>,
    occupied: usize,
}

impl TrackingTable {
    /// Creates an empty table with `size` slots.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "tracking table must have at least one slot");
        Self {
            entries: vec![TrackingEntry::default(); size],
            occupied: 0,
        }
    }

    #[inline]
    fn slot(&self, address: u64) -> usize {
        let slot = slot_hash(block(address), self.entries.len());
        assert!(slot < self.entries.len(), "tracking slot out of range");
        slot
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Number of valid entries.
    pub fn len(&self) -> usize {
        self.occupied
    }

    /// Returns `true` if no slot holds a valid entry.
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Returns `true` if the block of `address` is tracked.
    pub fn contains(&self, address: u64) -> bool {
        self.entries[self.slot(address)].holds(address)
    }

    /// Stored features for the block of `address`, if tracked.
    pub fn features(&self, address: u64) -> Option<&[u64]> {
        let entry = &self.entries[self.slot(address)];
        entry.holds(address).then_some(entry.features.as_slice())
    }

    /// Tracks `address` with `features`, returning the entry it displaced.
    ///
    /// # Panics
    ///
    /// Panics if the block is already tracked; callers check both tables
    /// before inserting.
    pub fn insert(&mut self, address: u64, features: Vec<u64>) -> Option<Evicted> {
        let slot = self.slot(address);
        let entry = &mut self.entries[slot];
        assert!(
            !entry.holds(address),
            "block {:#x} is already tracked",
            block(address)
        );

        let evicted = if entry.valid {
            Some(Evicted {
                address: entry.address,
                features: std::mem::take(&mut entry.features),
            })
        } else {
            self.occupied += 1;
            None
        };

        *entry = TrackingEntry {
            valid: true,
            address,
            features,
        };
        evicted
    }

    /// Stops tracking the block of `address`, returning its entry.
    pub fn remove(&mut self, address: u64) -> Option<Evicted> {
        let slot = self.slot(address);
        let entry = &mut self.entries[slot];
        if !entry.holds(address) {
            return None;
        }
        entry.valid = false;
        self.occupied -= 1;
        Some(Evicted {
            address: entry.address,
            features: std::mem::take(&mut entry.features),
        })
    }
}
