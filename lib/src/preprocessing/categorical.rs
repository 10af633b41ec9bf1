//! Categorical column block: sentinel imputation followed by one-hot encoding.

use crate::dataset::Table;
use crate::preprocessing::encoding::{
    FittedOneHotEncoder, HandleUnknown, OneHotEncoder, OneHotEncoderParams,
};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::imputation::{
    CategoryImputer, CategoryImputerParams, FittedCategoryImputer, DEFAULT_FILL_VALUE,
};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

fn text_columns(
    table: &Table,
    columns: &[String],
) -> Result<Vec<Vec<Option<String>>>, PreprocessingError> {
    columns.iter().map(|name| table.text_values(name)).collect()
}

/// Serializable parameters for a fitted CategoricalTransformer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoricalTransformerParams {
    pub columns: Vec<String>,
    pub imputer: CategoryImputerParams,
    pub encoder: OneHotEncoderParams,
}

/// Imputer + one-hot encoder over a fixed list of text columns (unfitted).
///
/// Unknown categories at transform time produce an all-zero block.
#[derive(Clone, Debug)]
pub struct CategoricalTransformer {
    columns: Vec<String>,
    fill_value: String,
}

impl CategoricalTransformer {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            fill_value: DEFAULT_FILL_VALUE.to_string(),
        }
    }

    /// Sentinel used for missing categories.
    pub fn with_fill_value(mut self, fill_value: impl Into<String>) -> Self {
        self.fill_value = fill_value.into();
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Transformer for CategoricalTransformer {
    type Input = Table;
    type Output = Array2<f64>;
    type Params = CategoricalTransformerParams;
    type Fitted = FittedCategoricalTransformer;

    fn fit(&self, table: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if table.is_empty() {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit CategoricalTransformer on empty data".to_string(),
            ));
        }

        let raw = text_columns(table, &self.columns)?;
        let imputer = CategoryImputer::new(self.fill_value.clone()).fit(&raw)?;
        let imputed = imputer.transform(&raw)?;
        let encoder = OneHotEncoder::new()
            .with_handle_unknown(HandleUnknown::Ignore)
            .fit(&imputed)?;

        FittedCategoricalTransformer::new(self.columns.clone(), imputer, encoder)
    }
}

/// Fitted categorical block with frozen vocabularies.
#[derive(Clone, Debug)]
pub struct FittedCategoricalTransformer {
    columns: Vec<String>,
    imputer: FittedCategoryImputer,
    encoder: FittedOneHotEncoder,
    feature_names: Vec<String>,
}

impl FittedCategoricalTransformer {
    fn new(
        columns: Vec<String>,
        imputer: FittedCategoryImputer,
        encoder: FittedOneHotEncoder,
    ) -> Result<Self, PreprocessingError> {
        let feature_names = encoder.feature_names(&columns)?;
        Ok(Self {
            columns,
            imputer,
            encoder,
            feature_names,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn fill_value(&self) -> &str {
        self.imputer.fill_value()
    }

    /// Fit-time vocabulary of every column, sorted.
    pub fn vocabularies(&self) -> &[Vec<String>] {
        self.encoder.categories()
    }

    /// `"{column}_{category}"` for every output column.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

impl FittedTransformer for FittedCategoricalTransformer {
    type Input = Table;
    type Output = Array2<f64>;
    type Params = CategoricalTransformerParams;

    fn transform(&self, table: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        if self.columns.is_empty() {
            return Ok(Array2::zeros((table.n_rows(), 0)));
        }
        let raw = text_columns(table, &self.columns)?;
        let imputed = self.imputer.transform(&raw)?;
        self.encoder.transform(&imputed)
    }

    fn extract_params(&self) -> Self::Params {
        CategoricalTransformerParams {
            columns: self.columns.clone(),
            imputer: self.imputer.extract_params(),
            encoder: self.encoder.extract_params(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        let imputer = FittedCategoryImputer::from_params(params.imputer)?;
        let encoder = FittedOneHotEncoder::from_params(params.encoder)?;
        if imputer.n_features_in() != params.columns.len() {
            return Err(PreprocessingError::SerializationError(format!(
                "categorical params cover {} columns but imputer has {}",
                params.columns.len(),
                imputer.n_features_in()
            )));
        }
        Self::new(params.columns, imputer, encoder)
            .map_err(|e| PreprocessingError::SerializationError(e.to_string()))
    }

    fn n_features_in(&self) -> usize {
        self.columns.len()
    }

    fn n_features_out(&self) -> usize {
        self.encoder.n_features_out()
    }
}
