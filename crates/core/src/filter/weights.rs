//! Hashed feature weight tables.
//!
//! One table of signed saturating weights per feature slot. A feature value
//! selects its weight through `hash(value) mod table_size`; aliasing between
//! values is expected and is part of the model's noise, not an error.
//!
//! # Performance
//!
//! - **Time Complexity:** `get()` and `adjust()` are O(1); `sum()` is O(F)
//!   where F is the number of feature slots.
//! - **Space Complexity:** O(F × T) where T is the table size.

/// Maps a feature value onto `0..limit`.
///
/// The filter hash is a plain modulo; spreading is left to the feature
/// values themselves.
///
/// # Panics
///
/// Panics if `limit` is zero.
#[inline]
pub fn hash(value: u64, limit: usize) -> usize {
    assert!(limit != 0, "feature hash called with a zero modulus");
    let index = (value % limit as u64) as usize;
    debug_assert!(index < limit);
    index
}

/// Per-slot weight tables of one filter instance.
#[derive(Debug, Clone)]
pub struct WeightTables {
    tables: Vec<Vec<i32>>,
    size: usize,
    max_weight: i32,
}

impl WeightTables {
    /// Creates `slots` zeroed tables of `size` entries saturating at `±max_weight`.
    ///
    /// # Panics
    ///
    /// Panics if `slots` or `size` is zero, or `max_weight` is not positive.
    pub fn new(slots: usize, size: usize, max_weight: i32) -> Self {
        assert!(slots > 0, "a filter needs at least one feature slot");
        assert!(size > 0, "weight tables must be non-empty");
        assert!(max_weight > 0, "max_weight must be positive");
        Self {
            tables: vec![vec![0; size]; slots],
            size,
            max_weight,
        }
    }

    /// Number of feature slots.
    #[inline]
    pub fn slots(&self) -> usize {
        self.tables.len()
    }

    /// Entries per table.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Saturation bound.
    #[inline]
    pub fn max_weight(&self) -> i32 {
        self.max_weight
    }

    /// Table index selected by `feature`.
    #[inline]
    pub fn index(&self, feature: u64) -> usize {
        hash(feature, self.size)
    }

    /// Reads the weight `feature` selects in `slot`.
    #[inline]
    pub fn get(&self, slot: usize, feature: u64) -> i32 {
        self.tables[slot][self.index(feature)]
    }

    /// Sums the weights selected by a full feature vector.
    ///
    /// # Panics
    ///
    /// Panics if `features.len()` differs from the slot count.
    pub fn sum(&self, features: &[u64]) -> i32 {
        assert_eq!(
            features.len(),
            self.slots(),
            "feature vector length does not match the weight table count"
        );
        features
            .iter()
            .enumerate()
            .map(|(slot, &feature)| self.get(slot, feature))
            .sum()
    }

    /// Applies `delta` to the weight `feature` selects in `slot`.
    ///
    /// The update is dropped when the result would leave
    /// `[-max_weight, max_weight]`. Returns whether it applied.
    pub fn adjust(&mut self, slot: usize, feature: u64, delta: i32) -> bool {
        let index = self.index(feature);
        let weight = &mut self.tables[slot][index];
        match weight.checked_add(delta) {
            Some(next) if next.abs() <= self.max_weight => {
                *weight = next;
                true
            }
            _ => false,
        }
    }

    /// Raw table of one slot.
    pub fn table(&self, slot: usize) -> &[i32] {
        &self.tables[slot]
    }

    /// Histogram of the weights in `slot`, in buckets of 8 over
    /// `[-max_weight, max_weight]`. The top value folds into the last bucket.
    pub fn histogram(&self, slot: usize) -> Vec<u64> {
        let buckets = ((self.max_weight * 2) / 8).max(1) as usize;
        let mut counts = vec![0u64; buckets];
        for &weight in &self.tables[slot] {
            let idx = ((weight + self.max_weight) / 8) as usize;
            counts[idx.min(buckets - 1)] += 1;
        }
        counts
    }
}
