//! Trace replay harness.
//!
//! Parses textual event traces and replays them against a modelled L1-I so
//! the hybrid can be exercised without a host simulator.

/// Trace replay driver.
pub mod replay;

/// Trace format and parser.
pub mod trace;

pub use self::replay::Replay;
pub use self::trace::{TraceEvent, parse_trace, read_trace, synthetic_loop};
