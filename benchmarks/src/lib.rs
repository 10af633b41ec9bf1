//! Benchmark utilities for housing-prep.
//!
//! Provides the California housing loader and a seeded synthetic generator
//! used by the criterion benches and the `prepare_data` binary.

pub mod data;

pub use data::CaliforniaHousingDataset;
