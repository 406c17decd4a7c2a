//! Unit tests, one module per library component.



/// Configuration parsing and validation.
pub mod config;

/// Perceptron filter and its tables.
pub mod filter;



/// Trace parsing and replay.
pub mod sim;
