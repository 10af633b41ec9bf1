//! Dataset loaders for benchmarks and the data-preparation binary.

pub mod california_housing;

pub use california_housing::{CaliforniaHousingDataset, OCEAN_PROXIMITY};
