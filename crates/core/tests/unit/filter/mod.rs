//! Filter unit tests.



/// Tracking tables.
pub mod tracking;
