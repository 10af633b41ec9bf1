//! Simple Imputer.
//!
//! Imputation transformer for completing missing numeric values.
//! Supports mean, median and constant strategies.
//!
//! Note: This implementation treats NaN as missing values.
//!
//! # Example
//! ```ignore
//! use housing_prep::preprocessing::{
//!     FittedTransformer, ImputeStrategy, SimpleImputer, Transformer,
//! };
//!
//! let imputer = SimpleImputer::new(ImputeStrategy::Median);
//! let fitted = imputer.fit(&data)?;
//! let imputed = fitted.transform(&data)?;
//! ```

use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Strategy for imputing missing values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace missing values with the mean of each column.
    Mean,
    /// Replace missing values with the median of each column.
    #[default]
    Median,
    /// Replace missing values with a constant value.
    Constant(f64),
}

/// Serializable parameters for a fitted SimpleImputer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimpleImputerParams {
    /// Strategy used for imputation.
    pub strategy: ImputeStrategy,
    /// Statistics (fill values) for each feature.
    pub statistics: Vec<f64>,
    /// Number of features seen during fit.
    pub n_features: usize,
}

/// SimpleImputer transformer (unfitted).
#[derive(Clone, Debug, Default)]
pub struct SimpleImputer {
    strategy: ImputeStrategy,
}

impl SimpleImputer {
    /// Create a new SimpleImputer with the specified strategy.
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }
}

/// Median of the given values. Caller guarantees a non-empty slice of finite values.
pub(crate) fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    if n % 2 == 0 {
        // Halve first so two large values cannot overflow
        values[n / 2 - 1] / 2.0 + values[n / 2] / 2.0
    } else {
        values[n / 2]
    }
}

/// Compute the fill value of every column, ignoring NaN values.
///
/// A column with no observed value falls back to 0.0.
fn compute_statistics(data: &Array2<f64>, strategy: &ImputeStrategy) -> Vec<f64> {
    data.axis_iter(Axis(1))
        .map(|column| {
            let mut observed: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
            if let ImputeStrategy::Constant(val) = strategy {
                return *val;
            }
            if observed.is_empty() {
                return 0.0;
            }
            match strategy {
                ImputeStrategy::Mean => observed.iter().sum::<f64>() / observed.len() as f64,
                ImputeStrategy::Median => median(&mut observed),
                ImputeStrategy::Constant(val) => *val,
            }
        })
        .collect()
}

impl Transformer for SimpleImputer {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = SimpleImputerParams;
    type Fitted = FittedSimpleImputer;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if data.nrows() == 0 {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit SimpleImputer on empty data".to_string(),
            ));
        }

        let statistics = compute_statistics(data, &self.strategy);

        Ok(FittedSimpleImputer {
            strategy: self.strategy.clone(),
            statistics: Array1::from(statistics),
        })
    }
}

/// Fitted SimpleImputer ready for inference.
#[derive(Clone, Debug)]
pub struct FittedSimpleImputer {
    strategy: ImputeStrategy,
    statistics: Array1<f64>,
}

impl FittedSimpleImputer {
    /// Get the imputation statistics (fill values) for each feature.
    pub fn statistics(&self) -> &Array1<f64> {
        &self.statistics
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }
}

impl FittedTransformer for FittedSimpleImputer {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = SimpleImputerParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        if data.ncols() != self.statistics.len() {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.statistics.len(),
                got_features: data.ncols(),
            });
        }

        let mut result = data.clone();
        for (mut column, &fill) in result.axis_iter_mut(Axis(1)).zip(self.statistics.iter()) {
            column.mapv_inplace(|v| if v.is_nan() { fill } else { v });
        }
        Ok(result)
    }

    fn extract_params(&self) -> Self::Params {
        SimpleImputerParams {
            strategy: self.strategy.clone(),
            statistics: self.statistics.to_vec(),
            n_features: self.statistics.len(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        if params.statistics.len() != params.n_features {
            return Err(PreprocessingError::SerializationError(format!(
                "SimpleImputer params hold {} statistics for {} features",
                params.statistics.len(),
                params.n_features
            )));
        }
        Ok(Self {
            strategy: params.strategy,
            statistics: Array1::from(params.statistics),
        })
    }

    fn n_features_in(&self) -> usize {
        self.statistics.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn create_test_data_with_missing() -> Array2<f64> {
        array![[1.0, f64::NAN], [3.0, 4.0], [5.0, 6.0]]
    }

    #[test]
    fn test_simple_imputer_mean() {
        let data = create_test_data_with_missing();
        let fitted = SimpleImputer::new(ImputeStrategy::Mean).fit(&data).unwrap();

        // Column 1: mean of [4, 6] = 5 (NaN excluded)
        assert!((fitted.statistics()[0] - 3.0).abs() < 1e-12);
        assert!((fitted.statistics()[1] - 5.0).abs() < 1e-12);

        let imputed = fitted.transform(&data).unwrap();
        assert_eq!(imputed, array![[1.0, 5.0], [3.0, 4.0], [5.0, 6.0]]);
    }

    #[test]
    fn test_simple_imputer_median_odd_and_even() {
        let data = array![[1.0, 10.0], [f64::NAN, 2.0], [100.0, 4.0], [2.0, f64::NAN]];
        let fitted = SimpleImputer::new(ImputeStrategy::Median).fit(&data).unwrap();

        // Column 0: median of [1, 2, 100] = 2; column 1: median of [2, 4, 10] = 4
        assert_eq!(fitted.statistics().to_vec(), vec![2.0, 4.0]);

        let even = array![[1.0], [3.0], [f64::NAN], [10.0], [20.0]];
        let fitted = SimpleImputer::new(ImputeStrategy::Median).fit(&even).unwrap();
        assert_eq!(fitted.statistics().to_vec(), vec![6.5]);
    }

    #[test]
    fn test_simple_imputer_median_of_large_pair() {
        let data = array![[1.5e308], [1.7e308], [f64::NAN]];
        let fitted = SimpleImputer::new(ImputeStrategy::Median).fit(&data).unwrap();
        assert!((fitted.statistics()[0] - 1.6e308).abs() < 1e294);
    }

    #[test]
    fn test_simple_imputer_constant() {
        let data = create_test_data_with_missing();
        let fitted = SimpleImputer::new(ImputeStrategy::Constant(-1.0))
            .fit(&data)
            .unwrap();

        let imputed = fitted.transform(&data).unwrap();
        assert_eq!(imputed[[0, 1]], -1.0);
        assert_eq!(imputed[[0, 0]], 1.0);
    }

    #[test]
    fn test_simple_imputer_all_missing_column() {
        let data = array![[f64::NAN, 1.0], [f64::NAN, 2.0]];
        let fitted = SimpleImputer::new(ImputeStrategy::Median).fit(&data).unwrap();
        assert_eq!(fitted.statistics()[0], 0.0);
    }

    #[test]
    fn test_simple_imputer_uses_fit_statistics_only() {
        let train = array![[1.0], [2.0], [3.0]];
        let fitted = SimpleImputer::new(ImputeStrategy::Median).fit(&train).unwrap();

        let test = array![[f64::NAN], [1000.0], [1000.0]];
        let imputed = fitted.transform(&test).unwrap();
        assert_eq!(imputed[[0, 0]], 2.0);
    }

    #[test]
    fn test_simple_imputer_serialization() {
        let data = create_test_data_with_missing();
        let fitted = SimpleImputer::new(ImputeStrategy::Median).fit(&data).unwrap();

        let params = fitted.extract_params();
        let restored = FittedSimpleImputer::from_params(params).unwrap();

        assert_eq!(
            fitted.transform(&data).unwrap(),
            restored.transform(&data).unwrap()
        );
    }

    #[test]
    fn test_simple_imputer_feature_mismatch() {
        let data = create_test_data_with_missing();
        let fitted = SimpleImputer::new(ImputeStrategy::Mean).fit(&data).unwrap();

        let wrong_data = array![[1.0, 2.0, 3.0]];
        let result = fitted.transform(&wrong_data);

        assert!(matches!(
            result,
            Err(PreprocessingError::FeatureMismatch {
                expected_features: 2,
                got_features: 3
            })
        ));
    }

    #[test]
    fn test_simple_imputer_empty_data() {
        let data = Array2::<f64>::zeros((0, 2));
        let result = SimpleImputer::new(ImputeStrategy::Mean).fit(&data);
        assert!(matches!(result, Err(PreprocessingError::EmptyData(_))));
    }

    #[test]
    fn test_simple_imputer_save_load_file() {
        let data = create_test_data_with_missing();
        let fitted = SimpleImputer::new(ImputeStrategy::Median).fit(&data).unwrap();

        let tmp = tempfile::tempdir().unwrap();
        let temp_file = tmp.path().join("imputer.bin");
        fitted.save_to_file(&temp_file).unwrap();

        let loaded = FittedSimpleImputer::load_from_file(&temp_file).unwrap();
        assert_eq!(loaded.n_features_in(), 2);
        assert_eq!(loaded.statistics(), fitted.statistics());
    }

    #[test]
    fn test_from_params_inconsistent() {
        let params = SimpleImputerParams {
            strategy: ImputeStrategy::Median,
            statistics: vec![1.0],
            n_features: 2,
        };
        assert!(FittedSimpleImputer::from_params(params).is_err());
    }
}
