//! Pipeline configuration, read from JSON.

use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::imputation::DEFAULT_FILL_VALUE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings shared by the training driver and the serving layer.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// CSV file with the labeled housing table.
    pub data_file: PathBuf,

    /// Column to predict.
    pub target_column: String,

    /// Seed for the train/test split.
    pub random_state: u64,

    /// Fraction of rows held out for evaluation, in (0, 1).
    pub test_size: f64,

    /// Directory receiving persisted artifacts.
    pub model_output_dir: PathBuf,

    /// Sentinel for missing categories.
    pub categorical_fill_value: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data/housing.csv"),
            target_column: "median_house_value".to_string(),
            random_state: 42,
            test_size: 0.2,
            model_output_dir: PathBuf::from("models"),
            categorical_fill_value: DEFAULT_FILL_VALUE.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, PreprocessingError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PreprocessingError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_target_column(mut self, target: impl Into<String>) -> Self {
        self.target_column = target.into();
        self
    }

    pub fn validate(&self) -> Result<(), PreprocessingError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PreprocessingError::Configuration(format!(
                "test_size must lie in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.target_column.trim().is_empty() {
            return Err(PreprocessingError::Configuration(
                "target_column must not be empty".to_string(),
            ));
        }
        if self.categorical_fill_value.is_empty() {
            return Err(PreprocessingError::Configuration(
                "categorical_fill_value must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
