//! # Configuration Tests
//!
//! JSON parsing with partial documents, defaults, and validation of every
//! rejected value.

use std::io::Write;

use hybridpf_core::common::ConfigError;
use hybridpf_core::config::{
    ArbitrationPolicy, Config, FilterMode, PredictorConfig, PredictorKind,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// Defaults pair a next-line and a stride predictor with tuned thresholds.
#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.validate(), Ok(()));

    let predictors = &config.hybrid.predictors;
    assert_eq!(predictors.len(), 2);
    assert_eq!(predictors[0].kind, PredictorKind::NextLine);
    assert_eq!(predictors[1].kind, PredictorKind::Stride);
    assert_eq!(predictors[0].filter.accept_threshold, -128);
    assert_eq!(predictors[1].filter.accept_threshold, -256);
    assert_eq!(predictors[1].filter.l2_threshold, -576);

    assert_eq!(config.hybrid.filter_mode, FilterMode::MultiLevel);
    assert_eq!(config.arbiter.policy, ArbitrationPolicy::RoundRobin);
    assert!(!config.arbiter.quota_enabled);
    assert_eq!(config.arbiter.epoch_size, 100_000);
}

/// An empty document is the default configuration.
#[test]
fn test_empty_json_is_default() {
    assert_eq!(Config::from_json("{}"), Ok(Config::default()));
}

/// Missing fields inside a predictor slot take their defaults.
#[test]
fn test_partial_predictor_slot() {
    let json = r#"{
        "hybrid": {
            "predictors": [
                { "kind": "Stride", "degree": 4, "filter": { "accept_threshold": 0 } }
            ],
            "filter_mode": "Merge"
        },
        "arbiter": { "policy": "Voting", "quota_enabled": true }
    }"#;
    let config = Config::from_json(json);
    let Ok(config) = config else {
        panic!("valid document rejected: {config:?}");
    };

    let slot = &config.hybrid.predictors[0];
    assert_eq!(slot.kind, PredictorKind::Stride);
    assert_eq!(slot.degree, 4);
    assert_eq!(slot.table_size, 64);
    assert_eq!(slot.filter.accept_threshold, 0);
    assert_eq!(slot.filter.l2_threshold, -256);
    assert_eq!(slot.filter.max_weight, 64);
    assert_eq!(config.hybrid.filter_mode, FilterMode::Merge);
    assert_eq!(config.arbiter.policy, ArbitrationPolicy::Voting);
    assert!(config.arbiter.quota_enabled);
}

/// Enum spellings and aliases.
#[rstest]
#[case("\"Off\"", FilterMode::Off)]
#[case("\"Binary\"", FilterMode::Binary)]
#[case("\"MultiLevel\"", FilterMode::MultiLevel)]
#[case("\"Multilevel\"", FilterMode::MultiLevel)]
#[case("\"Merge\"", FilterMode::Merge)]
fn test_filter_mode_names(#[case] text: &str, #[case] mode: FilterMode) {
    let parsed: Result<FilterMode, _> = serde_json::from_str(text);
    assert_eq!(parsed.ok(), Some(mode));
}

/// The round-robin policy accepts its short name.
#[test]
fn test_policy_alias() {
    let parsed: Result<ArbitrationPolicy, _> = serde_json::from_str("\"Rr\"");
    assert_eq!(parsed.ok(), Some(ArbitrationPolicy::RoundRobin));
}

fn with_slot(edit: impl FnOnce(&mut PredictorConfig)) -> Config {
    let mut config = Config::default();
    edit(&mut config.hybrid.predictors[1]);
    config
}

/// Every invalid value is reported with its field.
#[rstest]
#[case::no_predictors(
    { let mut c = Config::default(); c.hybrid.predictors.clear(); c },
    ConfigError::NoPredictors
)]
#[case::too_many_predictors(
    { let mut c = Config::default(); c.hybrid.predictors = vec![PredictorConfig::default(); 9]; c },
    ConfigError::TooManyPredictors { count: 9, max: 8 }
)]
#[case::zero_degree(
    with_slot(|p| p.degree = 0),
    ConfigError::Zero { field: "hybrid.predictors[].degree" }
)]
#[case::zero_weight_table(
    with_slot(|p| p.filter.table_size = 0),
    ConfigError::Zero { field: "hybrid.predictors[].filter.table_size" }
)]
#[case::max_weight(
    with_slot(|p| p.filter.max_weight = 0),
    ConfigError::MaxWeight { predictor: 1, value: 0 }
)]
#[case::threshold_order(
    with_slot(|p| p.filter.l2_threshold = p.filter.accept_threshold),
    ConfigError::ThresholdOrder { predictor: 1, accept: -256, l2: -256 }
)]
#[case::training_threshold(
    with_slot(|p| p.filter.training_threshold = -1),
    ConfigError::TrainingThreshold { predictor: 1, value: -1 }
)]
#[case::zero_slots(
    { let mut c = Config::default(); c.hybrid.prefetch_slots = 0; c },
    ConfigError::Zero { field: "hybrid.prefetch_slots" }
)]
#[case::zero_queue(
    { let mut c = Config::default(); c.arbiter.queue_capacity = 0; c },
    ConfigError::Zero { field: "arbiter.queue_capacity" }
)]
#[case::zero_epoch(
    { let mut c = Config::default(); c.arbiter.epoch_size = 0; c },
    ConfigError::Zero { field: "arbiter.epoch_size" }
)]
#[case::zero_ways(
    { let mut c = Config::default(); c.cache.ways = 0; c },
    ConfigError::Zero { field: "cache.ways" }
)]
fn test_validation_errors(#[case] config: Config, #[case] expected: ConfigError) {
    assert_eq!(config.validate(), Err(expected));
}

/// Syntax errors and invalid values both surface from `from_json`.
#[test]
fn test_from_json_errors() {
    assert!(matches!(Config::from_json("{"), Err(ConfigError::Parse(_))));
    assert!(matches!(
        Config::from_json(r#"{ "hybrid": { "filter_mode": "Sometimes" } }"#),
        Err(ConfigError::Parse(_))
    ));
    assert_eq!(
        Config::from_json(r#"{ "cache": { "sets": 0 } }"#),
        Err(ConfigError::Zero { field: "cache.sets" })
    );
}

/// Configuration files round-trip through the pretty printer.
#[test]
fn test_from_path() {
    let mut config = Config::default();
    config.arbiter.policy = ArbitrationPolicy::Voting;
    config.hybrid.prefetch_slots = 2;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    let json = serde_json::to_string_pretty(&config).unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file.flush().unwrap();

    assert_eq!(Config::from_path(file.path()), Ok(config));
}

/// Unreadable paths are I/O errors.
#[test]
fn test_from_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::from_path(dir.path().join("missing.json"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}
