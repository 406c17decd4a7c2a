//! Replay harness unit tests.

/// End-to-end replays.
pub mod replay;
