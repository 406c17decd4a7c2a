//! Bounded per-predictor candidate FIFO.

use std::collections::VecDeque;

use super::candidate::Candidate;

/// Candidates proposed by one predictor and not yet arbitrated.
///
/// Overflow drops the incoming candidate; producers are never blocked.
#[derive(Debug, Clone)]
pub struct PredictorQueue {
    entries: VecDeque<Candidate>,
    capacity: usize,
    dropped: u64,
}

impl PredictorQueue {
    /// Creates an empty queue holding at most `capacity` candidates.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Appends `candidate`, or drops it if the queue is full.
    /// Returns whether it was queued.
    pub fn push(&mut self, candidate: Candidate) -> bool {
        if self.entries.len() >= self.capacity {
            self.dropped = self.dropped.saturating_add(1);
            return false;
        }
        self.entries.push_back(candidate);
        true
    }

    /// Oldest candidate.
    pub fn front(&self) -> Option<&Candidate> {
        self.entries.front()
    }

    /// Removes and returns the oldest candidate.
    pub fn pop(&mut self) -> Option<Candidate> {
        self.entries.pop_front()
    }

    /// Queued candidates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of queued candidates.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Candidates dropped on overflow since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Queued candidates, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.entries.iter()
    }

    /// First queued candidate for `blk`.
    pub fn find_block(&self, blk: u64) -> Option<&Candidate> {
        self.entries.iter().find(|c| c.block() == blk)
    }

    /// Removes every candidate whose block satisfies `purge`.
    /// Returns the number removed.
    pub fn purge<F>(&mut self, mut purge: F) -> usize
    where
        F: FnMut(u64) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|c| !purge(c.block()));
        before - self.entries.len()
    }
}
