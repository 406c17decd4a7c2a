//! Least Recently Used (LRU) replacement state.
//!
//! One usage stack per set: index 0 is the most recently used way, the last
//! index the least recently used one.
//!
//! # Performance
//!
//! - **Time Complexity:** `touch()` is O(W) where W is the associativity;
//!   `victim()` is O(1).
//! - **Space Complexity:** O(S × W) where S is the number of sets.

/// LRU usage stacks of a set-associative tag array.
#[derive(Debug, Clone)]
pub struct LruPolicy {
    usage: Vec<Vec<usize>>,
}

impl LruPolicy {
    /// Creates LRU state for `sets` sets of `ways` ways.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            usage: (0..sets).map(|_| (0..ways).collect()).collect(),
        }
    }

    /// Moves `way` of `set` to the MRU position.
    pub fn touch(&mut self, set: usize, way: usize) {
        let stack = &mut self.usage[set];
        if let Some(pos) = stack.iter().position(|&x| x == way) {
            let _ = stack.remove(pos);
        }
        stack.insert(0, way);
    }

    /// Moves `way` of `set` to the LRU position, making it the next victim.
    pub fn demote(&mut self, set: usize, way: usize) {
        let stack = &mut self.usage[set];
        if let Some(pos) = stack.iter().position(|&x| x == way) {
            let _ = stack.remove(pos);
        }
        stack.push(way);
    }

    /// Least recently used way of `set`.
    pub fn victim(&self, set: usize) -> usize {
        self.usage[set].last().copied().unwrap_or(0)
    }
}
