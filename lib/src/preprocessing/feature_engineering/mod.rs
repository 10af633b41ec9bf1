//! Feature engineering.
//!
//! This module provides the stateless computation of new features from
//! existing columns.

pub mod derived;

pub use derived::{DerivedFeatureComputer, DERIVED_COLUMNS, SOURCE_COLUMNS};
