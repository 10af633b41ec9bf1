//! One-hot encoding for categorical features.
//!
//! Transforms string categories to one-hot (dummy) encoded indicator blocks.

use crate::preprocessing::encoding::HandleUnknown;
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One-hot encoder for categorical features.
///
/// Each input column is a categorical feature. The encoder learns the
/// distinct values present in each column during fitting and keeps them in
/// lexicographic order, so the output layout does not depend on row order.
///
/// Input is column-major: one `Vec<String>` per feature, all of equal length.
/// Missing values must be imputed beforehand.
///
/// # Example
/// ```ignore
/// use housing_prep::preprocessing::{OneHotEncoder, Transformer};
///
/// let data = vec![vec!["NEAR BAY".to_string(), "INLAND".to_string()]];
/// let fitted = OneHotEncoder::new().fit(&data)?;
///
/// // Categories: ["INLAND", "NEAR BAY"]
/// let encoded = fitted.transform(&data)?;
/// // [[0, 1],
/// //  [1, 0]]
/// ```
#[derive(Clone, Debug, Default)]
pub struct OneHotEncoder {
    /// How to handle unknown categories during transform.
    handle_unknown: HandleUnknown,
}

impl OneHotEncoder {
    /// Create a new OneHotEncoder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strategy for handling unknown categories.
    pub fn with_handle_unknown(mut self, strategy: HandleUnknown) -> Self {
        self.handle_unknown = strategy;
        self
    }
}

/// Serializable parameters for a fitted OneHotEncoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoderParams {
    /// Categories (sorted distinct values) for each input column.
    pub categories: Vec<Vec<String>>,
    /// Handle unknown strategy.
    pub handle_unknown: HandleUnknown,
}

/// Fitted OneHotEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedOneHotEncoder {
    /// Categories (sorted distinct values) for each input column.
    categories: Vec<Vec<String>>,
    /// Total number of output features (sum of vocabulary sizes).
    n_features_out: usize,
    handle_unknown: HandleUnknown,
}

impl FittedOneHotEncoder {
    fn new(categories: Vec<Vec<String>>, handle_unknown: HandleUnknown) -> Self {
        let n_features_out = categories.iter().map(Vec::len).sum();
        Self {
            categories,
            n_features_out,
            handle_unknown,
        }
    }

    /// Get the categories learned for each feature.
    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }

    /// Get the number of categories per input feature.
    pub fn n_values(&self) -> Vec<usize> {
        self.categories.iter().map(Vec::len).collect()
    }

    pub fn handle_unknown(&self) -> HandleUnknown {
        self.handle_unknown
    }

    /// Output column names, `"{column}_{category}"`, for the given input names.
    pub fn feature_names<S: AsRef<str>>(
        &self,
        columns: &[S],
    ) -> Result<Vec<String>, PreprocessingError> {
        if columns.len() != self.categories.len() {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.categories.len(),
                got_features: columns.len(),
            });
        }
        Ok(columns
            .iter()
            .zip(&self.categories)
            .flat_map(|(column, cats)| {
                cats.iter()
                    .map(move |cat| format!("{}_{}", column.as_ref(), cat))
            })
            .collect())
    }
}

impl Transformer for OneHotEncoder {
    type Input = [Vec<String>];
    type Output = Array2<f64>;
    type Params = OneHotEncoderParams;
    type Fitted = FittedOneHotEncoder;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if data.first().is_some_and(Vec::is_empty) {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit OneHotEncoder on empty data".to_string(),
            ));
        }

        let categories = data
            .iter()
            .map(|column| {
                column
                    .iter()
                    .cloned()
                    .collect::<BTreeSet<String>>()
                    .into_iter()
                    .collect()
            })
            .collect();

        Ok(FittedOneHotEncoder::new(categories, self.handle_unknown))
    }
}

impl FittedTransformer for FittedOneHotEncoder {
    type Input = [Vec<String>];
    type Output = Array2<f64>;
    type Params = OneHotEncoderParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        if data.len() != self.categories.len() {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.categories.len(),
                got_features: data.len(),
            });
        }

        let rows = data.first().map(Vec::len).unwrap_or(0);
        let mut result = Array2::<f64>::zeros((rows, self.n_features_out));

        let mut offset = 0;
        for (col, (values, cats)) in data.iter().zip(&self.categories).enumerate() {
            if values.len() != rows {
                return Err(PreprocessingError::InvalidParameter(format!(
                    "categorical column {} has {} rows, expected {}",
                    col,
                    values.len(),
                    rows
                )));
            }
            for (row, value) in values.iter().enumerate() {
                match cats.binary_search(value) {
                    Ok(idx) => result[[row, offset + idx]] = 1.0,
                    Err(_) if self.handle_unknown == HandleUnknown::Error => {
                        return Err(PreprocessingError::InvalidParameter(format!(
                            "Unknown category '{}' in column {}",
                            value, col
                        )));
                    }
                    // With Ignore, the block stays all zeros
                    Err(_) => {}
                }
            }
            offset += cats.len();
        }

        Ok(result)
    }

    fn extract_params(&self) -> Self::Params {
        OneHotEncoderParams {
            categories: self.categories.clone(),
            handle_unknown: self.handle_unknown,
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        for cats in &params.categories {
            if cats.windows(2).any(|w| w[0] >= w[1]) {
                return Err(PreprocessingError::SerializationError(
                    "OneHotEncoder categories must be sorted and distinct".to_string(),
                ));
            }
        }
        Ok(FittedOneHotEncoder::new(
            params.categories,
            params.handle_unknown,
        ))
    }

    fn n_features_in(&self) -> usize {
        self.categories.len()
    }

    fn n_features_out(&self) -> usize {
        self.n_features_out
    }
}
