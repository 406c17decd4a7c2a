//! # Replay Tests
//!
//! End-to-end runs of the hybrid against the modelled L1-I.

use std::io::Write;

use hybridpf_core::config::{Config, FilterMode};
use hybridpf_core::sim::{Replay, read_trace, synthetic_loop};

use crate::common::init_tracing;

const BASE: u64 = 0x40_0000;

/// Next-line prefetching hides almost every miss of a sequential loop.
#[test]
fn test_loop_replay_prefetches() {
    init_tracing();
    let mut replay = Replay::new(&Config::default()).unwrap();
    let stats = replay.run(&synthetic_loop(BASE, 16, 20)).clone();

    assert_eq!(stats.fetches, 320);
    assert_eq!(stats.branches, 20);
    assert_eq!(stats.hits + stats.misses, stats.fetches);
    assert!(stats.issued_l1 > 0);
    assert!(stats.prefetch_hits > 0);
    assert!(stats.misses < 16, "{} misses", stats.misses);
}

/// Disabling the filter still issues through the arbiter.
#[test]
fn test_unfiltered_replay() {
    let mut config = Config::default();
    config.hybrid.filter_mode = FilterMode::Off;
    let mut replay = Replay::new(&config).unwrap();
    let stats = replay.run(&synthetic_loop(BASE, 8, 4)).clone();

    assert!(stats.prefetch_hits > 0);
    assert_eq!(stats.issued_l2, 0);
    assert_eq!(replay.hybrid().filter(0).stats().decisions(), 0);
}

/// A filter that rejects everything leaves only the cold misses.
#[test]
fn test_rejecting_filter_leaves_cold_misses() {
    let mut config = Config::default();
    config.hybrid.predictors.truncate(1);
    config.hybrid.predictors[0].filter.accept_threshold = 1000;
    config.hybrid.predictors[0].filter.l2_threshold = 999;
    let mut replay = Replay::new(&config).unwrap();
    let stats = replay.run(&synthetic_loop(BASE, 8, 3)).clone();

    assert_eq!(stats.issued_l1, 0);
    assert_eq!(stats.misses, 8);
    assert_eq!(stats.hits, 16);
}

/// Traces read from disk replay the same as generated ones, and the report
/// carries both the replay and the hybrid sections.
#[test]
fn test_replay_from_file_and_report() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for event in 0..4u64 {
        writeln!(file, "F {:#x}", BASE + event * 64).unwrap();
    }
    writeln!(file, "B {:#x} cond {BASE:#x}", BASE + 3 * 64 + 60).unwrap();
    file.flush().unwrap();

    let events = read_trace(file.path()).unwrap();
    assert_eq!(events, synthetic_loop(BASE, 4, 1));

    let mut replay = Replay::new(&Config::default()).unwrap();
    let _ = replay.run(&events);
    let report = replay.report();
    assert!(report.contains("REPLAY STATISTICS"));
    assert!(report.contains("Hybrid prefetcher"));
    assert!(replay.stats().mpki() > 0.0);
}
