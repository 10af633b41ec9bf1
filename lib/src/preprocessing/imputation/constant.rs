//! Constant-token imputation for categorical columns.
//!
//! Missing categories are replaced by a fixed sentinel token, never by the
//! column's most frequent value. The sentinel then behaves like any other
//! category downstream.

use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use serde::{Deserialize, Serialize};

/// Default sentinel for missing categories.
pub const DEFAULT_FILL_VALUE: &str = "missing";

/// Serializable parameters for a fitted CategoryImputer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryImputerParams {
    pub fill_value: String,
    pub n_features: usize,
}

/// Imputer for columns of optional strings (unfitted).
#[derive(Clone, Debug)]
pub struct CategoryImputer {
    fill_value: String,
}

impl Default for CategoryImputer {
    fn default() -> Self {
        Self::new(DEFAULT_FILL_VALUE)
    }
}

impl CategoryImputer {
    pub fn new(fill_value: impl Into<String>) -> Self {
        Self {
            fill_value: fill_value.into(),
        }
    }
}

impl Transformer for CategoryImputer {
    type Input = [Vec<Option<String>>];
    type Output = Vec<Vec<String>>;
    type Params = CategoryImputerParams;
    type Fitted = FittedCategoryImputer;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if data.first().is_some_and(Vec::is_empty) {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit CategoryImputer on empty data".to_string(),
            ));
        }
        Ok(FittedCategoryImputer {
            fill_value: self.fill_value.clone(),
            n_features: data.len(),
        })
    }
}

/// Fitted CategoryImputer.
#[derive(Clone, Debug)]
pub struct FittedCategoryImputer {
    fill_value: String,
    n_features: usize,
}

impl FittedCategoryImputer {
    pub fn fill_value(&self) -> &str {
        &self.fill_value
    }
}

impl FittedTransformer for FittedCategoryImputer {
    type Input = [Vec<Option<String>>];
    type Output = Vec<Vec<String>>;
    type Params = CategoryImputerParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        if data.len() != self.n_features {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.n_features,
                got_features: data.len(),
            });
        }
        Ok(data
            .iter()
            .map(|column| {
                column
                    .iter()
                    .map(|v| v.clone().unwrap_or_else(|| self.fill_value.clone()))
                    .collect()
            })
            .collect())
    }

    fn extract_params(&self) -> Self::Params {
        CategoryImputerParams {
            fill_value: self.fill_value.clone(),
            n_features: self.n_features,
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        Ok(Self {
            fill_value: params.fill_value,
            n_features: params.n_features,
        })
    }

    fn n_features_in(&self) -> usize {
        self.n_features
    }
}
