//! Common types shared by the filter, the arbiter and the hybrid driver.
//!
//! This module provides:
//! 1. **Addresses:** Block alignment helpers for 64-byte instruction blocks.
//! 2. **Constants:** Block geometry and predictor-count limits.
//! 3. **Branch Kinds:** Classification of resolved branches reported by the host.
//! 4. **Error Handling:** Boundary errors for configuration and trace input.

/// Block address helpers.
pub mod addr;

/// Common constants used throughout the crate.
pub mod constants;

/// Branch classification reported by the host.
pub mod data;

/// Error types for configuration and trace loading.
pub mod error;

pub use addr::{block, block_base, same_block};
pub use constants::{BLOCK_SIZE, LOG2_BLOCK_SIZE, MAX_PREDICTORS};
pub use data::BranchKind;
pub use error::{ConfigError, TraceError};
