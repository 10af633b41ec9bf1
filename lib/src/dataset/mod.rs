//! Tabular data and dataset partitioning.
//!
//! - [`Table`]: ordered, named, typed columns with missing-value support;
//!   built from records or delimited text.
//! - [`DatasetSplitter`]: seeded train/holdout partitioning.

pub mod split;
pub mod table;

pub use split::{train_test_split, DatasetSplitter};
pub use table::{Column, ColumnData, Record, Table, Value};
