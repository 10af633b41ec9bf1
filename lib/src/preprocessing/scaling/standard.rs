//! Standard Scaler (Z-score normalization).
//!
//! Transforms features by removing the mean and scaling to unit variance.
//!
//! The standard score of a sample `x` is calculated as:
//! ```text
//! z = (x - u) / s
//! ```
//! where `u` is the mean of the training samples, and `s` is the population
//! standard deviation (ddof = 0) of the training samples.
//!
//! A feature with zero variance at fit time records `s = 1` and is flagged
//! constant; its scaled value is `0` for every input.

use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Serializable parameters for a fitted StandardScaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScalerParams {
    /// Mean of each feature.
    pub mean: Vec<f64>,
    /// Population standard deviation of each feature (1.0 for constant features).
    pub scale: Vec<f64>,
    /// Features that had zero variance at fit time.
    pub constant: Vec<bool>,
}

/// StandardScaler transformer (unfitted).
#[derive(Clone, Debug, Default)]
pub struct StandardScaler;

impl StandardScaler {
    /// Create a new StandardScaler.
    pub fn new() -> Self {
        Self
    }
}

/// Index of the first feature whose mean or standard deviation is not finite.
///
/// Finite inputs above roughly 1e154 overflow the variance.
pub(crate) fn overflowing_feature(mean: &Array1<f64>, std: &Array1<f64>) -> Option<usize> {
    mean.iter()
        .zip(std.iter())
        .position(|(m, s)| !m.is_finite() || !s.is_finite())
}

impl Transformer for StandardScaler {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = StandardScalerParams;
    type Fitted = FittedStandardScaler;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if data.nrows() == 0 {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit StandardScaler on empty data".to_string(),
            ));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(PreprocessingError::InvalidParameter(
                "StandardScaler expects imputed, finite input".to_string(),
            ));
        }

        let mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| PreprocessingError::EmptyData("no rows to average".to_string()))?;
        let std = data.std_axis(Axis(0), 0.0);
        if let Some(j) = overflowing_feature(&mean, &std) {
            return Err(PreprocessingError::InvalidParameter(format!(
                "feature {} is too large to standardize (mean {}, std {})",
                j, mean[j], std[j]
            )));
        }

        let constant: Vec<bool> = std.iter().map(|&s| s == 0.0).collect();
        let scale = std.mapv(|s| if s == 0.0 { 1.0 } else { s });

        Ok(FittedStandardScaler {
            mean,
            scale,
            constant,
        })
    }
}

/// Fitted StandardScaler ready for inference.
#[derive(Clone, Debug)]
pub struct FittedStandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
    constant: Vec<bool>,
}

impl FittedStandardScaler {
    /// Get the mean values for each feature.
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Get the scale (standard deviation) for each feature.
    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    /// Which features had zero variance at fit time.
    pub fn constant(&self) -> &[bool] {
        &self.constant
    }
}

impl FittedTransformer for FittedStandardScaler {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = StandardScalerParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        if data.ncols() != self.mean.len() {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.mean.len(),
                got_features: data.ncols(),
            });
        }

        let mut result = (data - &self.mean) / &self.scale;
        for (mut column, &is_constant) in result.axis_iter_mut(Axis(1)).zip(&self.constant) {
            if is_constant {
                column.fill(0.0);
            }
        }
        Ok(result)
    }

    fn extract_params(&self) -> Self::Params {
        StandardScalerParams {
            mean: self.mean.to_vec(),
            scale: self.scale.to_vec(),
            constant: self.constant.clone(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        let n = params.mean.len();
        if params.scale.len() != n || params.constant.len() != n {
            return Err(PreprocessingError::SerializationError(
                "StandardScaler params have inconsistent lengths".to_string(),
            ));
        }
        if params.scale.iter().any(|&s| s == 0.0 || !s.is_finite()) {
            return Err(PreprocessingError::SerializationError(
                "StandardScaler params contain a zero or non-finite scale".to_string(),
            ));
        }
        Ok(Self {
            mean: Array1::from(params.mean),
            scale: Array1::from(params.scale),
            constant: params.constant,
        })
    }

    fn n_features_in(&self) -> usize {
        self.mean.len()
    }
}
