//! Batch analysis helpers.

pub mod aggregator;

pub use aggregator::*;
