//! Configuration for the hybrid prefetcher.
//!
//! This module defines all configuration structures and enums used to
//! parameterize the subsystem. It provides:
//! 1. **Defaults:** Baseline filter, arbiter and shadow-cache constants.
//! 2. **Structures:** Hierarchical config for the hybrid driver, each
//!    sub-predictor and its filter, the arbiter and the shadow caches.
//! 3. **Enums:** Filter mode, arbitration policy and sub-predictor kind.
//!
//! Configuration is supplied as JSON (see [`Config::from_json`]) or built with
//! `Config::default()`. Every field has a default, so partial documents are
//! accepted.

use serde::{Deserialize, Serialize};

use crate::common::constants::MAX_PREDICTORS;
use crate::common::error::ConfigError;

/// Default configuration constants.
mod defaults {
    /// Saturation bound of every filter weight.
    pub const MAX_WEIGHT: i32 = 64;

    /// Entries per feature weight table.
    pub const WEIGHT_TABLE_SIZE: usize = 4096;

    /// Entries in each of the accept and reject tracking tables.
    pub const TRACKING_TABLE_SIZE: usize = 1024;

    /// Scores with a magnitude above this are not trained.
    pub const TRAINING_THRESHOLD: i32 = 320;

    /// Scores strictly above this are accepted into the L1.
    pub const ACCEPT_THRESHOLD: i32 = -128;

    /// Scores strictly above this (and not above the accept threshold) go to the L2.
    pub const L2_THRESHOLD: i32 = -256;

    /// Capacity of each per-predictor candidate queue.
    pub const QUEUE_CAPACITY: usize = 32;

    /// Capacity of each per-predictor sent-history window.
    pub const HISTORY_CAPACITY: usize = 128;

    /// Accesses per metrics epoch.
    pub const EPOCH_SIZE: u64 = 100_000;

    /// Cap on the per-epoch prefetch hit count of one predictor.
    pub const MAX_PF_HITS: u64 = 1 << 20;

    /// Shadow cache sets (32 KiB, 8-way, 64-byte lines).
    pub const SHADOW_SETS: usize = 64;

    /// Shadow cache associativity.
    pub const SHADOW_WAYS: usize = 8;

    /// Prefetch issue slots offered to the arbiter each cycle.
    pub const PREFETCH_SLOTS: usize = 4;

    /// Default prefetch degree of the reference predictors.
    pub const PREDICTOR_DEGREE: usize = 2;

    /// Default table size of the reference predictors.
    pub const PREDICTOR_TABLE_SIZE: usize = 64;
}

/// How the learned filter gates candidates leaving the arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum FilterMode {
    /// Every selected candidate is issued to the L1.
    Off,
    /// Accept/reject with the winning predictor's filter.
    Binary,
    /// L1 / L2 / reject with the winning predictor's filter.
    #[default]
    #[serde(alias = "Multilevel")]
    MultiLevel,
    /// Candidates proposed by several predictors are issued if any of the
    /// proposers' filters accepts; single proposals behave like `Binary`.
    Merge,
}

/// Arbitration policy used by [`PrefetchArbiter::select`](crate::arbiter::PrefetchArbiter::select).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum ArbitrationPolicy {
    /// Priority-ordered round robin with per-predictor quotas.
    ///
    /// Quotas only apply when [`ArbiterConfig::quota_enabled`] is set, which
    /// is off by default; otherwise every turn is bounded by the target count.
    #[default]
    #[serde(alias = "Rr")]
    RoundRobin,
    /// Addresses proposed by several predictors win first.
    Voting,
}

/// Reference sub-predictor implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum PredictorKind {
    /// Next-N-blocks on every access.
    #[default]
    NextLine,
    /// Per-region block stride detection.
    Stride,
}

/// Parameters of one learned filter instance.
///
/// Each sub-predictor owns a filter, and thresholds are usually tuned per
/// predictor: aggressive predictors get a higher accept threshold.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FilterParams {
    /// Weight saturation bound (`MAX_WEIGHT`).
    #[serde(default = "FilterParams::default_max_weight")]
    pub max_weight: i32,

    /// Entries per feature weight table.
    #[serde(default = "FilterParams::default_table_size")]
    pub table_size: usize,

    /// Entries in each tracking table.
    #[serde(default = "FilterParams::default_tracking_table_size")]
    pub tracking_table_size: usize,

    /// Training threshold: entries scored beyond this magnitude are not trained.
    #[serde(default = "FilterParams::default_training_threshold")]
    pub training_threshold: i32,

    /// L1 accept threshold.
    #[serde(default = "FilterParams::default_accept_threshold")]
    pub accept_threshold: i32,

    /// L2 threshold used in multi-level mode.
    #[serde(default = "FilterParams::default_l2_threshold")]
    pub l2_threshold: i32,
}

impl FilterParams {
    fn default_max_weight() -> i32 {
        defaults::MAX_WEIGHT
    }

    fn default_table_size() -> usize {
        defaults::WEIGHT_TABLE_SIZE
    }

    fn default_tracking_table_size() -> usize {
        defaults::TRACKING_TABLE_SIZE
    }

    fn default_training_threshold() -> i32 {
        defaults::TRAINING_THRESHOLD
    }

    fn default_accept_threshold() -> i32 {
        defaults::ACCEPT_THRESHOLD
    }

    fn default_l2_threshold() -> i32 {
        defaults::L2_THRESHOLD
    }

    fn validate(&self, predictor: usize) -> Result<(), ConfigError> {
        if self.max_weight <= 0 {
            return Err(ConfigError::MaxWeight {
                predictor,
                value: self.max_weight,
            });
        }
        if self.table_size == 0 {
            return Err(ConfigError::Zero {
                field: "hybrid.predictors[].filter.table_size",
            });
        }
        if self.tracking_table_size == 0 {
            return Err(ConfigError::Zero {
                field: "hybrid.predictors[].filter.tracking_table_size",
            });
        }
        if self.training_threshold < 0 {
            return Err(ConfigError::TrainingThreshold {
                predictor,
                value: self.training_threshold,
            });
        }
        if self.l2_threshold >= self.accept_threshold {
            return Err(ConfigError::ThresholdOrder {
                predictor,
                accept: self.accept_threshold,
                l2: self.l2_threshold,
            });
        }
        Ok(())
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            max_weight: defaults::MAX_WEIGHT,
            table_size: defaults::WEIGHT_TABLE_SIZE,
            tracking_table_size: defaults::TRACKING_TABLE_SIZE,
            training_threshold: defaults::TRAINING_THRESHOLD,
            accept_threshold: defaults::ACCEPT_THRESHOLD,
            l2_threshold: defaults::L2_THRESHOLD,
        }
    }
}

/// One sub-predictor slot: which reference predictor to build and its filter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PredictorConfig {
    /// Predictor implementation.
    #[serde(default)]
    pub kind: PredictorKind,

    /// Blocks proposed per trigger.
    #[serde(default = "PredictorConfig::default_degree")]
    pub degree: usize,

    /// Pattern table entries (ignored by `NextLine`).
    #[serde(default = "PredictorConfig::default_table_size")]
    pub table_size: usize,

    /// Parameters of the filter that scores this predictor's candidates.
    #[serde(default)]
    pub filter: FilterParams,
}

impl PredictorConfig {
    fn default_degree() -> usize {
        defaults::PREDICTOR_DEGREE
    }

    fn default_table_size() -> usize {
        defaults::PREDICTOR_TABLE_SIZE
    }

    /// Creates a slot of `kind` with default degree, table size and filter.
    pub fn new(kind: PredictorKind) -> Self {
        Self {
            kind,
            degree: defaults::PREDICTOR_DEGREE,
            table_size: defaults::PREDICTOR_TABLE_SIZE,
            filter: FilterParams::default(),
        }
    }
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self::new(PredictorKind::NextLine)
    }
}

/// Hybrid driver settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HybridConfig {
    /// Sub-predictors in id order.
    #[serde(default = "HybridConfig::default_predictors")]
    pub predictors: Vec<PredictorConfig>,

    /// Filter gating mode.
    #[serde(default)]
    pub filter_mode: FilterMode,

    /// Feed hit, harm and accuracy feedback into the arbiter metrics.
    #[serde(default = "HybridConfig::default_metrics")]
    pub metrics: bool,

    /// Prefetch issue slots offered to the arbiter per cycle.
    #[serde(default = "HybridConfig::default_prefetch_slots")]
    pub prefetch_slots: usize,
}

impl HybridConfig {
    fn default_predictors() -> Vec<PredictorConfig> {
        let stride = PredictorConfig {
            filter: FilterParams {
                accept_threshold: -256,
                l2_threshold: -576,
                ..FilterParams::default()
            },
            ..PredictorConfig::new(PredictorKind::Stride)
        };
        vec![PredictorConfig::new(PredictorKind::NextLine), stride]
    }

    fn default_metrics() -> bool {
        true
    }

    fn default_prefetch_slots() -> usize {
        defaults::PREFETCH_SLOTS
    }
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            predictors: Self::default_predictors(),
            filter_mode: FilterMode::default(),
            metrics: true,
            prefetch_slots: defaults::PREFETCH_SLOTS,
        }
    }
}

/// Arbiter settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArbiterConfig {
    /// Selection policy.
    #[serde(default)]
    pub policy: ArbitrationPolicy,

    /// Per-predictor queue capacity (`MAX_QUEUE`).
    #[serde(default = "ArbiterConfig::default_queue_capacity")]
    pub queue_capacity: usize,

    /// Per-predictor sent-history window (`MAX_HISTORY`).
    #[serde(default = "ArbiterConfig::default_history_capacity")]
    pub history_capacity: usize,

    /// Accesses per metrics epoch (`EPOCH_SIZE`).
    #[serde(default = "ArbiterConfig::default_epoch_size")]
    pub epoch_size: u64,

    /// Cap on a predictor's per-epoch prefetch hit count.
    #[serde(default = "ArbiterConfig::default_max_pf_hits")]
    pub max_pf_hits: u64,

    /// Enforce the metric-derived per-predictor quotas in round-robin mode.
    #[serde(default)]
    pub quota_enabled: bool,
}

impl ArbiterConfig {
    fn default_queue_capacity() -> usize {
        defaults::QUEUE_CAPACITY
    }

    fn default_history_capacity() -> usize {
        defaults::HISTORY_CAPACITY
    }

    fn default_epoch_size() -> u64 {
        defaults::EPOCH_SIZE
    }

    fn default_max_pf_hits() -> u64 {
        defaults::MAX_PF_HITS
    }
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            policy: ArbitrationPolicy::default(),
            queue_capacity: defaults::QUEUE_CAPACITY,
            history_capacity: defaults::HISTORY_CAPACITY,
            epoch_size: defaults::EPOCH_SIZE,
            max_pf_hits: defaults::MAX_PF_HITS,
            quota_enabled: false,
        }
    }
}

/// Geometry shared by the main, baseline and per-predictor shadow caches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ShadowCacheConfig {
    /// Number of sets.
    #[serde(default = "ShadowCacheConfig::default_sets")]
    pub sets: usize,

    /// Associativity.
    #[serde(default = "ShadowCacheConfig::default_ways")]
    pub ways: usize,
}

impl ShadowCacheConfig {
    fn default_sets() -> usize {
        defaults::SHADOW_SETS
    }

    fn default_ways() -> usize {
        defaults::SHADOW_WAYS
    }
}

impl Default for ShadowCacheConfig {
    fn default() -> Self {
        Self {
            sets: defaults::SHADOW_SETS,
            ways: defaults::SHADOW_WAYS,
        }
    }
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use hybridpf_core::config::{ArbitrationPolicy, Config, FilterMode};
///
/// let json = r#"{
///     "hybrid": { "filter_mode": "Binary", "prefetch_slots": 2 },
///     "arbiter": { "policy": "Voting", "queue_capacity": 16 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.hybrid.filter_mode, FilterMode::Binary);
/// assert_eq!(config.arbiter.policy, ArbitrationPolicy::Voting);
/// assert_eq!(config.arbiter.queue_capacity, 16);
/// assert_eq!(config.cache.ways, 8);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Hybrid driver and sub-predictor configuration.
    #[serde(default)]
    pub hybrid: HybridConfig,
    /// Arbiter configuration.
    #[serde(default)]
    pub arbiter: ArbiterConfig,
    /// Shadow cache geometry.
    #[serde(default)]
    pub cache: ShadowCacheConfig,
}

impl Config {
    /// Parses and validates a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json(&text)
    }

    /// Checks every value the constructors rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let count = self.hybrid.predictors.len();
        if count == 0 {
            return Err(ConfigError::NoPredictors);
        }
        if count > MAX_PREDICTORS {
            return Err(ConfigError::TooManyPredictors {
                count,
                max: MAX_PREDICTORS,
            });
        }
        for (id, predictor) in self.hybrid.predictors.iter().enumerate() {
            if predictor.degree == 0 {
                return Err(ConfigError::Zero {
                    field: "hybrid.predictors[].degree",
                });
            }
            if predictor.table_size == 0 {
                return Err(ConfigError::Zero {
                    field: "hybrid.predictors[].table_size",
                });
            }
            predictor.filter.validate(id)?;
        }
        if self.hybrid.prefetch_slots == 0 {
            return Err(ConfigError::Zero {
                field: "hybrid.prefetch_slots",
            });
        }
        if self.arbiter.queue_capacity == 0 {
            return Err(ConfigError::Zero {
                field: "arbiter.queue_capacity",
            });
        }
        if self.arbiter.history_capacity == 0 {
            return Err(ConfigError::Zero {
                field: "arbiter.history_capacity",
            });
        }
        if self.arbiter.epoch_size == 0 {
            return Err(ConfigError::Zero {
                field: "arbiter.epoch_size",
            });
        }
        if self.cache.sets == 0 {
            return Err(ConfigError::Zero { field: "cache.sets" });
        }
        if self.cache.ways == 0 {
            return Err(ConfigError::Zero { field: "cache.ways" });
        }
        Ok(())
    }
}
