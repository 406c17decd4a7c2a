//! Shared fixtures for the unit tests.


/// Scripted sub-predictors.
pub mod predictors;

use std::sync::Once;

use hybridpf_core::arbiter::Candidate;
use hybridpf_core::config::{
    ArbiterConfig, ArbitrationPolicy, Config, FilterMode, FilterParams, PredictorConfig,
    PredictorKind,
};

static TRACING: Once = Once::new();

/// Routes `tracing` output through the test harness writer.
///
/// Set `RUST_LOG=hybridpf_core=trace` to see filter and arbiter decisions.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Filter parameters with a small weight table and explicit thresholds.
pub fn filter_params(accept_threshold: i32, l2_threshold: i32) -> FilterParams {
    FilterParams {
        max_weight: 64,
        table_size: 16,
        tracking_table_size: 64,
        training_threshold: 320,
        accept_threshold,
        l2_threshold,
    }
}

/// Arbiter configuration with the given policy and quota setting.
pub fn arbiter_config(policy: ArbitrationPolicy, quota_enabled: bool) -> ArbiterConfig {
    ArbiterConfig {
        policy,
        quota_enabled,
        ..ArbiterConfig::default()
    }
}

/// Block-aligned byte address of block `blk`.
pub const fn addr(blk: u64) -> u64 {
    blk << 6
}

/// Candidate of predictor `id` for block `blk`.
pub fn candidate(id: usize, blk: u64) -> Candidate {
    Candidate::new(id, addr(blk))
}

/// Configuration with `n` next-line slots using `filter` and `mode`.
pub fn hybrid_config(n: usize, filter: &FilterParams, mode: FilterMode) -> Config {
    let mut config = Config::default();
    config.hybrid.predictors = (0..n)
        .map(|_| PredictorConfig {
            filter: filter.clone(),
            ..PredictorConfig::new(PredictorKind::NextLine)
        })
        .collect();
    config.hybrid.filter_mode = mode;
    config
}

/// Float comparison for derived ratios.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
