//! Learned prefetch admission and arbitration for hybrid L1-I prefetchers.
//!
//! This crate sits between several independent instruction prefetchers and
//! the L1 instruction cache. It provides:
//! 1. **Filter:** A hashed perceptron (PPF) that accepts, demotes to the L2,
//!    or rejects each prefetch candidate and trains itself from later demand
//!    accesses and tracking-table evictions.
//! 2. **Arbiter:** Per-predictor queues drained once per cycle by round robin
//!    with metric-derived quotas, or by voting, with deduplication against a
//!    shadow cache.
//! 3. **Metrics:** Epoch-windowed accuracy, coverage and harmfulness per
//!    predictor.
//! 4. **Hybrid driver:** Host callbacks wiring predictors, arbiter and
//!    filters together, plus what-if shadow caches for harm attribution.
//! 5. **Replay:** A trace-driven harness and reference predictors.

/// Arbiter, candidate queues and epoch metrics.
pub mod arbiter;
/// Shadow cache model and the cache probe contract.
pub mod cache;
/// Common types and constants (block addresses, branch kinds, errors).
pub mod common;
/// Configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Perceptron prefetch filter.
pub mod filter;
/// Hybrid prefetcher driver.
pub mod hybrid;
/// Sub-predictor trait and reference predictors.
pub mod predictor;
/// Trace parsing and replay.
pub mod sim;
/// Replay statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Candidate arbiter.
pub use crate::arbiter::PrefetchArbiter;
/// Learned filter.
pub use crate::filter::Ppf;
/// Hybrid driver; construct with `HybridPrefetcher::new`.
pub use crate::hybrid::HybridPrefetcher;
/// Trace replay harness.
pub use crate::sim::Replay;
