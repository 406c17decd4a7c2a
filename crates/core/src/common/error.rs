//! Boundary error types.
//!
//! Everything inside the filter and the arbiter treats contract violations
//! (feature-length mismatches, a block tracked in both tables, a zero hash
//! modulus) as panics. The types here cover the two places where bad input
//! is expected and must be reported instead:
//! 1. **Configuration:** Values rejected by [`Config::validate`](crate::config::Config::validate).
//! 2. **Traces:** I/O failures and malformed lines in replay traces.

use thiserror::Error;

/// Invalid configuration value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No sub-predictors were configured.
    #[error("at least one sub-predictor must be configured")]
    NoPredictors,

    /// More sub-predictors than overlap masks can represent.
    #[error("{count} sub-predictors configured, at most {max} are supported")]
    TooManyPredictors {
        /// Number of predictors requested.
        count: usize,
        /// Supported maximum.
        max: usize,
    },

    /// The supplied predictor list does not match the configured slots.
    #[error("{found} sub-predictors supplied for {expected} configured slots")]
    PredictorCount {
        /// Configured predictor slots.
        expected: usize,
        /// Predictors supplied.
        found: usize,
    },

    /// A size or capacity field was zero.
    #[error("`{field}` must be non-zero")]
    Zero {
        /// Dotted path of the offending field.
        field: &'static str,
    },

    /// The maximum weight magnitude was not positive.
    #[error("predictor {predictor}: max_weight must be positive, got {value}")]
    MaxWeight {
        /// Index of the predictor whose filter is misconfigured.
        predictor: usize,
        /// Configured value.
        value: i32,
    },

    /// The L2 threshold was not strictly below the L1 accept threshold.
    #[error("predictor {predictor}: l2_threshold ({l2}) must be below accept_threshold ({accept})")]
    ThresholdOrder {
        /// Index of the predictor whose filter is misconfigured.
        predictor: usize,
        /// Configured L1 accept threshold.
        accept: i32,
        /// Configured L2 threshold.
        l2: i32,
    },

    /// The training threshold was negative.
    #[error("predictor {predictor}: training_threshold must be non-negative, got {value}")]
    TrainingThreshold {
        /// Index of the predictor whose filter is misconfigured.
        predictor: usize,
        /// Configured value.
        value: i32,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(String),

    /// The configuration file was not valid JSON for [`Config`](crate::config::Config).
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Failure while loading or parsing a replay trace.
#[derive(Error, Debug)]
pub enum TraceError {
    /// The trace file could not be read.
    #[error("failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    /// A line did not start with a known event tag.
    #[error("line {line}: unknown event `{tag}`")]
    UnknownEvent {
        /// 1-based line number.
        line: usize,
        /// The unrecognised tag.
        tag: String,
    },

    /// An event had the wrong number of fields.
    #[error("line {line}: expected {expected} fields after `{tag}`, found {found}")]
    FieldCount {
        /// 1-based line number.
        line: usize,
        /// Event tag.
        tag: &'static str,
        /// Fields the event requires.
        expected: usize,
        /// Fields present on the line.
        found: usize,
    },

    /// A numeric field did not parse.
    #[error("line {line}: invalid number `{text}`")]
    Number {
        /// 1-based line number.
        line: usize,
        /// The offending text.
        text: String,
    },

    /// A branch kind was neither a known mnemonic nor a 3-bit code.
    #[error("line {line}: invalid branch kind `{text}`")]
    BranchKind {
        /// 1-based line number.
        line: usize,
        /// The offending text.
        text: String,
    },
}
