//! Deterministic train/holdout partitioning.

use crate::dataset::table::Table;
use crate::preprocessing::error::PreprocessingError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

/// Splits a table into training and holdout rows.
///
/// The seed is an explicit parameter: the same seed, table and fraction
/// always yield the same row membership and order.
///
/// # Example
/// ```ignore
/// let (train, test) = DatasetSplitter::new(0.2, 42)?.split(&table)?;
/// ```
#[derive(Clone, Debug)]
pub struct DatasetSplitter {
    test_size: f64,
    seed: u64,
}

impl DatasetSplitter {
    /// `test_size` is the holdout fraction and must lie strictly between 0 and 1.
    pub fn new(test_size: f64, seed: u64) -> Result<Self, PreprocessingError> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(PreprocessingError::Configuration(format!(
                "test_size must be in (0, 1), got {}",
                test_size
            )));
        }
        Ok(Self { test_size, seed })
    }

    pub fn test_size(&self) -> f64 {
        self.test_size
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Row indices of the (train, holdout) partition for `n_rows` rows.
    pub fn split_indices(
        &self,
        n_rows: usize,
    ) -> Result<(Vec<usize>, Vec<usize>), PreprocessingError> {
        let n_test = (self.test_size * n_rows as f64).ceil() as usize;
        if n_test == 0 || n_test >= n_rows {
            return Err(PreprocessingError::Configuration(format!(
                "test_size {} leaves an empty split for {} rows",
                self.test_size, n_rows
            )));
        }

        let mut indices: Vec<usize> = (0..n_rows).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        let train = indices.split_off(n_test);
        Ok((train, indices))
    }

    /// Partition a table into (train, holdout).
    pub fn split(&self, table: &Table) -> Result<(Table, Table), PreprocessingError> {
        let (train_idx, test_idx) = self.split_indices(table.n_rows())?;
        info!(
            train = train_idx.len(),
            test = test_idx.len(),
            seed = self.seed,
            "dataset split"
        );
        Ok((table.take_rows(&train_idx), table.take_rows(&test_idx)))
    }
}

/// Shorthand for `DatasetSplitter::new(test_size, seed)?.split(table)`.
pub fn train_test_split(
    table: &Table,
    test_size: f64,
    seed: u64,
) -> Result<(Table, Table), PreprocessingError> {
    DatasetSplitter::new(test_size, seed)?.split(table)
}
