//! Numeric column block: median imputation followed by standardization.
//!
//! Statistics are learned once, on the training table, and replayed on every
//! later table. Standardization is fit on the *imputed* training columns.

use crate::dataset::Table;
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::imputation::{
    FittedSimpleImputer, ImputeStrategy, SimpleImputer, SimpleImputerParams,
};
use crate::preprocessing::scaling::standard::overflowing_feature;
use crate::preprocessing::scaling::{FittedStandardScaler, StandardScaler, StandardScalerParams};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Gather named numeric columns into a matrix, missing cells as NaN.
pub(crate) fn numeric_matrix(
    table: &Table,
    columns: &[String],
) -> Result<Array2<f64>, PreprocessingError> {
    let mut matrix = Array2::from_elem((table.n_rows(), columns.len()), f64::NAN);
    for (j, name) in columns.iter().enumerate() {
        let values = table.numeric_values(name)?;
        for (i, value) in values.into_iter().enumerate() {
            if let Some(v) = value {
                matrix[[i, j]] = v;
            }
        }
    }
    Ok(matrix)
}

/// Serializable parameters for a fitted NumericTransformer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumericTransformerParams {
    pub columns: Vec<String>,
    pub imputer: SimpleImputerParams,
    pub scaler: StandardScalerParams,
}

/// Imputer + scaler over a fixed list of numeric columns (unfitted).
#[derive(Clone, Debug)]
pub struct NumericTransformer {
    columns: Vec<String>,
    strategy: ImputeStrategy,
}

impl NumericTransformer {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            strategy: ImputeStrategy::Median,
        }
    }

    pub fn with_strategy(mut self, strategy: ImputeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Transformer for NumericTransformer {
    type Input = Table;
    type Output = Array2<f64>;
    type Params = NumericTransformerParams;
    type Fitted = FittedNumericTransformer;

    fn fit(&self, table: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if table.is_empty() {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit NumericTransformer on empty data".to_string(),
            ));
        }

        let raw = numeric_matrix(table, &self.columns)?;
        let imputer = SimpleImputer::new(self.strategy.clone()).fit(&raw)?;
        let imputed = imputer.transform(&raw)?;
        let scaler = StandardScaler::new().fit(&imputed).map_err(|err| {
            let mean = imputed.mean_axis(Axis(0));
            let std = imputed.std_axis(Axis(0), 0.0);
            match mean.and_then(|mean| overflowing_feature(&mean, &std)) {
                Some(j) => PreprocessingError::InvalidParameter(format!(
                    "column '{}' is too large to standardize",
                    self.columns[j]
                )),
                None => err,
            }
        })?;

        Ok(FittedNumericTransformer {
            columns: self.columns.clone(),
            imputer,
            scaler,
        })
    }
}

/// Fitted numeric block.
#[derive(Clone, Debug)]
pub struct FittedNumericTransformer {
    columns: Vec<String>,
    imputer: FittedSimpleImputer,
    scaler: FittedStandardScaler,
}

impl FittedNumericTransformer {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Per-column fill values learned at fit time.
    pub fn imputer(&self) -> &FittedSimpleImputer {
        &self.imputer
    }

    pub fn scaler(&self) -> &FittedStandardScaler {
        &self.scaler
    }
}

impl FittedTransformer for FittedNumericTransformer {
    type Input = Table;
    type Output = Array2<f64>;
    type Params = NumericTransformerParams;

    fn transform(&self, table: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        let raw = numeric_matrix(table, &self.columns)?;
        let imputed = self.imputer.transform(&raw)?;
        self.scaler.transform(&imputed)
    }

    fn extract_params(&self) -> Self::Params {
        NumericTransformerParams {
            columns: self.columns.clone(),
            imputer: self.imputer.extract_params(),
            scaler: self.scaler.extract_params(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        let imputer = FittedSimpleImputer::from_params(params.imputer)?;
        let scaler = FittedStandardScaler::from_params(params.scaler)?;
        let n = params.columns.len();
        if imputer.n_features_in() != n || scaler.n_features_in() != n {
            return Err(PreprocessingError::SerializationError(format!(
                "numeric params cover {} columns but imputer has {} and scaler {}",
                n,
                imputer.n_features_in(),
                scaler.n_features_in()
            )));
        }
        Ok(Self {
            columns: params.columns,
            imputer,
            scaler,
        })
    }

    fn n_features_in(&self) -> usize {
        self.columns.len()
    }
}
