//! Shadow instruction cache.
//!
//! A tag-only, set-associative model of the L1-I used for three jobs:
//! 1. **Probing:** the arbiter drops candidates whose block is already
//!    resident or has a prefetch in flight.
//! 2. **What-if views:** the hybrid driver keeps one baseline copy (no
//!    prefetching) and one copy per predictor (only that predictor's
//!    prefetches), used to attribute harm.
//! 3. **Replay:** the trace harness uses it as the cache under test.
//!
//! Lines are tracked by block number. Replacement is LRU; invalid ways are
//! filled before anything is evicted.

/// LRU replacement state.
pub mod lru;

use self::lru::LruPolicy;
use crate::common::addr::block;
use crate::common::constants::LOG2_BLOCK_SIZE;
use crate::config::ShadowCacheConfig;

/// Result of a side-effect free residency query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Probe {
    /// The block is present.
    pub resident: bool,
    /// The block was installed by a prefetch that no demand access has
    /// consumed yet.
    pub inflight_prefetch: bool,
}

impl Probe {
    /// Returns `true` if issuing a prefetch for this block would be redundant.
    pub const fn is_redundant(self) -> bool {
        self.resident || self.inflight_prefetch
    }
}

/// Result of a demand access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Access {
    /// The block was present.
    pub hit: bool,
    /// The hit consumed a prefetched line for the first time.
    pub prefetch_hit: bool,
    /// Block address displaced by the fill on a miss.
    pub evicted: Option<u64>,
}

/// Residency contract the arbiter and the hybrid driver rely on.
pub trait CacheProbe {
    /// Reports residency of the block of `address` without side effects.
    fn probe(&self, address: u64) -> Probe;

    /// Records a speculative fill, returning the address it displaced.
    fn insert_as_prefetch(&mut self, address: u64) -> Option<u64>;

    /// Records a demand access or fill. A non-zero `evicted_address` is
    /// invalidated first so the model follows the real cache's eviction.
    fn insert_as_demand(&mut self, address: u64, evicted_address: u64);
}

/// Probe that reports nothing resident and records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl CacheProbe for NullProbe {
    fn probe(&self, _address: u64) -> Probe {
        Probe::default()
    }

    fn insert_as_prefetch(&mut self, _address: u64) -> Option<u64> {
        None
    }

    fn insert_as_demand(&mut self, _address: u64, _evicted_address: u64) {}
}

#[derive(Debug, Clone, Copy, Default)]
struct Line {
    valid: bool,
    block: u64,
    prefetch: bool,
    used: bool,
}

/// Tag-only set-associative cache model.
#[derive(Debug, Clone)]
pub struct ShadowCache {
    lines: Vec<Line>,
    sets: usize,
    ways: usize,
    policy: LruPolicy,
}

impl ShadowCache {
    /// Creates an empty cache with the configured geometry.
    pub fn new(config: &ShadowCacheConfig) -> Self {
        Self::with_geometry(config.sets, config.ways)
    }

    /// Creates an empty cache of `sets` × `ways` lines.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn with_geometry(sets: usize, ways: usize) -> Self {
        assert!(sets > 0 && ways > 0, "shadow cache needs at least one line");
        Self {
            lines: vec![Line::default(); sets * ways],
            sets,
            ways,
            policy: LruPolicy::new(sets, ways),
        }
    }

    /// Number of sets.
    pub fn sets(&self) -> usize {
        self.sets
    }

    /// Associativity.
    pub fn ways(&self) -> usize {
        self.ways
    }

    /// Number of valid lines.
    pub fn occupancy(&self) -> usize {
        self.lines.iter().filter(|line| line.valid).count()
    }

    #[inline]
    fn set_of(&self, blk: u64) -> usize {
        (blk % self.sets as u64) as usize
    }

    fn find(&self, blk: u64) -> Option<(usize, usize)> {
        let set = self.set_of(blk);
        let base = set * self.ways;
        (0..self.ways)
            .find(|&way| {
                let line = &self.lines[base + way];
                line.valid && line.block == blk
            })
            .map(|way| (set, way))
    }

    /// Returns `true` if the block of `address` is present.
    pub fn contains(&self, address: u64) -> bool {
        self.find(block(address)).is_some()
    }

    /// Installs `blk` and returns the address of the valid block it evicted.
    fn install(&mut self, blk: u64, prefetch: bool) -> Option<u64> {
        let set = self.set_of(blk);
        let base = set * self.ways;
        let way = (0..self.ways)
            .find(|&way| !self.lines[base + way].valid)
            .unwrap_or_else(|| self.policy.victim(set));

        let victim = self.lines[base + way];
        self.lines[base + way] = Line {
            valid: true,
            block: blk,
            prefetch,
            used: false,
        };
        self.policy.touch(set, way);
        victim.valid.then_some(victim.block << LOG2_BLOCK_SIZE)
    }

    /// Demand lookup of `address`, filling the block on a miss.
    pub fn access(&mut self, address: u64) -> Access {
        let blk = block(address);
        if let Some((set, way)) = self.find(blk) {
            let line = &mut self.lines[set * self.ways + way];
            let prefetch_hit = line.prefetch && !line.used;
            line.used = true;
            self.policy.touch(set, way);
            return Access {
                hit: true,
                prefetch_hit,
                evicted: None,
            };
        }
        Access {
            hit: false,
            prefetch_hit: false,
            evicted: self.install(blk, false),
        }
    }

    /// Drops the block of `address`. Returns whether it was present.
    pub fn invalidate(&mut self, address: u64) -> bool {
        let Some((set, way)) = self.find(block(address)) else {
            return false;
        };
        self.lines[set * self.ways + way].valid = false;
        self.policy.demote(set, way);
        true
    }
}

impl CacheProbe for ShadowCache {
    fn probe(&self, address: u64) -> Probe {
        self.find(block(address)).map_or_else(Probe::default, |(set, way)| {
            let line = &self.lines[set * self.ways + way];
            Probe {
                resident: true,
                inflight_prefetch: line.prefetch && !line.used,
            }
        })
    }

    /// Already resident blocks are left untouched.
    fn insert_as_prefetch(&mut self, address: u64) -> Option<u64> {
        let blk = block(address);
        if self.find(blk).is_some() {
            return None;
        }
        self.install(blk, true)
    }

    fn insert_as_demand(&mut self, address: u64, evicted_address: u64) {
        if evicted_address != 0 {
            let _ = self.invalidate(evicted_address);
        }
        let _ = self.access(address);
    }
}
