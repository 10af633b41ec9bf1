//! Serving boundary: request validation and the shared prediction context.
//!
//! Transport is out of scope. A web layer deserializes [`HousingFeatures`],
//! holds one [`ServiceContext`] behind an `Arc` for the life of the process,
//! and maps [`ServingError::status_code`] onto its responses.

use crate::dataset::{Record, Value};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::preprocessor::Preprocessor;
use crate::training::{latest_artifact, PREPROCESSOR_PREFIX};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Closed category set accepted for `ocean_proximity`.
pub const OCEAN_PROXIMITY_CATEGORIES: [&str; 5] =
    ["<1H OCEAN", "INLAND", "NEAR OCEAN", "NEAR BAY", "ISLAND"];

/// Raw features of one housing block, as sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousingFeatures {
    pub longitude: f64,
    pub latitude: f64,
    pub housing_median_age: f64,
    pub total_rooms: f64,
    pub total_bedrooms: f64,
    pub population: f64,
    pub households: f64,
    /// In tens of thousands of dollars.
    pub median_income: f64,
    pub ocean_proximity: String,
}

/// A request field outside its accepted domain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        field: &'static str,
        value: f64,
        min: f64,
    },
    #[error(
        "ocean_proximity must be one of <1H OCEAN, INLAND, NEAR OCEAN, NEAR BAY, ISLAND; \
         got '{0}'"
    )]
    UnknownCategory(String),
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::OutOfRange { field, .. }
            | ValidationError::BelowMinimum { field, .. } => field,
            ValidationError::UnknownCategory(_) => "ocean_proximity",
        }
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    // NaN fails both comparisons
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn check_min(field: &'static str, value: f64, min: f64) -> Result<(), ValidationError> {
    if value >= min && value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::BelowMinimum { field, value, min })
    }
}

impl HousingFeatures {
    /// Reject values the model was never meant to see.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("longitude", self.longitude, -125.0, -114.0)?;
        check_range("latitude", self.latitude, 32.0, 42.0)?;
        check_range("housing_median_age", self.housing_median_age, 1.0, 100.0)?;
        check_min("total_rooms", self.total_rooms, 1.0)?;
        check_min("total_bedrooms", self.total_bedrooms, 1.0)?;
        check_min("population", self.population, 1.0)?;
        check_min("households", self.households, 1.0)?;
        check_min("median_income", self.median_income, 0.0)?;
        if !OCEAN_PROXIMITY_CATEGORIES.contains(&self.ocean_proximity.as_str()) {
            return Err(ValidationError::UnknownCategory(self.ocean_proximity.clone()));
        }
        Ok(())
    }

    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        let numeric = [
            ("longitude", self.longitude),
            ("latitude", self.latitude),
            ("housing_median_age", self.housing_median_age),
            ("total_rooms", self.total_rooms),
            ("total_bedrooms", self.total_bedrooms),
            ("population", self.population),
            ("households", self.households),
            ("median_income", self.median_income),
        ];
        for (name, value) in numeric {
            record.insert(name.to_string(), Value::Number(value));
        }
        record.insert(
            "ocean_proximity".to_string(),
            Value::Text(self.ocean_proximity.clone()),
        );
        record
    }
}

/// Opaque trained model.
pub trait Regressor {
    /// One prediction per matrix row.
    fn predict(&self, features: &Array2<f64>) -> Array1<f64>;

    fn name(&self) -> &str;
}

#[derive(Debug, Error)]
pub enum ServingError {
    #[error("instance {index}: {source}")]
    Validation {
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("request contains no instances")]
    EmptyBatch,
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),
    #[error("model returned {got} predictions for {expected} instances")]
    Model { expected: usize, got: usize },
}

impl ServingError {
    /// HTTP status for this error: client mistakes are 422, everything
    /// raised past validation is 500.
    pub fn status_code(&self) -> u16 {
        match self {
            ServingError::Validation { .. } | ServingError::EmptyBatch => 422,
            ServingError::Preprocessing(_) | ServingError::Model { .. } => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    pub predictions: Vec<f64>,
    pub model_name: String,
    pub count: usize,
    /// Ordered preprocessor output columns, for diagnostics.
    pub feature_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub model_name: Option<String>,
    pub n_features: usize,
}

/// Fitted preprocessor and model, built once at startup and read-only after.
pub struct ServiceContext {
    preprocessor: Preprocessor,
    model: Box<dyn Regressor + Send + Sync>,
}

impl ServiceContext {
    /// Fails with [`PreprocessingError::NotFitted`] unless the preprocessor
    /// is fitted or reloaded.
    pub fn new(
        preprocessor: Preprocessor,
        model: Box<dyn Regressor + Send + Sync>,
    ) -> Result<Self, PreprocessingError> {
        let n_features = preprocessor.n_features_out()?;
        info!(
            model = model.name(),
            features = n_features,
            "service context ready"
        );
        Ok(Self {
            preprocessor,
            model,
        })
    }

    /// Load the newest persisted preprocessor from `model_dir`.
    pub fn from_model_dir<P: AsRef<Path>>(
        model_dir: P,
        model: Box<dyn Regressor + Send + Sync>,
    ) -> Result<Self, PreprocessingError> {
        let dir = model_dir.as_ref();
        let path = latest_artifact(dir, PREPROCESSOR_PREFIX)?.ok_or_else(|| {
            warn!(dir = %dir.display(), "no persisted preprocessor found");
            PreprocessingError::IoError(format!(
                "no {}*.bin artifact in {}",
                PREPROCESSOR_PREFIX,
                dir.display()
            ))
        })?;
        Self::new(Preprocessor::load_from_file(path)?, model)
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Validate, preprocess and predict a batch.
    pub fn predict(
        &self,
        instances: &[HousingFeatures],
    ) -> Result<PredictionResponse, ServingError> {
        if instances.is_empty() {
            return Err(ServingError::EmptyBatch);
        }
        for (index, instance) in instances.iter().enumerate() {
            instance
                .validate()
                .map_err(|source| ServingError::Validation { index, source })?;
        }

        let records: Vec<Record> = instances.iter().map(HousingFeatures::to_record).collect();
        let features = self.preprocessor.transform_records(&records)?;
        let predictions = self.model.predict(&features);
        if predictions.len() != instances.len() {
            return Err(ServingError::Model {
                expected: instances.len(),
                got: predictions.len(),
            });
        }

        Ok(PredictionResponse {
            count: predictions.len(),
            predictions: predictions.to_vec(),
            model_name: self.model.name().to_string(),
            feature_names: self.preprocessor.feature_names()?.to_vec(),
        })
    }

    /// Predict a single instance.
    pub fn predict_one(&self, instance: &HousingFeatures) -> Result<f64, ServingError> {
        let response = self.predict(std::slice::from_ref(instance))?;
        Ok(response.predictions[0])
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "healthy",
            model_loaded: true,
            model_name: Some(self.model.name().to_string()),
            n_features: self.preprocessor.n_features_out().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Table;
    use std::sync::Arc;

    /// Sums each row; enough to see the matrix reach the model.
    struct RowSum;

    impl Regressor for RowSum {
        fn predict(&self, features: &Array2<f64>) -> Array1<f64> {
            features.sum_axis(ndarray::Axis(1))
        }

        fn name(&self) -> &str {
            "row_sum"
        }
    }

    struct Broken;

    impl Regressor for Broken {
        fn predict(&self, _features: &Array2<f64>) -> Array1<f64> {
            Array1::zeros(0)
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn example() -> HousingFeatures {
        HousingFeatures {
            longitude: -122.23,
            latitude: 37.88,
            housing_median_age: 41.0,
            total_rooms: 880.0,
            total_bedrooms: 129.0,
            population: 322.0,
            households: 126.0,
            median_income: 8.3252,
            ocean_proximity: "NEAR BAY".to_string(),
        }
    }

    fn fitted_preprocessor() -> Preprocessor {
        let rows = [
            (-122.23, 880.0, 126.0, "NEAR BAY", 452600.0),
            (-121.50, 1500.0, 300.0, "INLAND", 150000.0),
            (-118.30, 2200.0, 410.0, "<1H OCEAN", 310000.0),
            (-117.10, 1900.0, 350.0, "INLAND", 120000.0),
        ];
        let records: Vec<Record> = rows
            .iter()
            .map(|&(longitude, rooms, households, proximity, value)| {
                let mut features = example();
                features.longitude = longitude;
                features.total_rooms = rooms;
                features.households = households;
                features.ocean_proximity = proximity.to_string();
                let mut record = features.to_record();
                record.insert("median_house_value".to_string(), Value::Number(value));
                record
            })
            .collect();

        let mut preprocessor = Preprocessor::new("median_house_value");
        preprocessor
            .fit_transform(&Table::from_records(&records).unwrap())
            .unwrap();
        preprocessor
    }

    fn context() -> ServiceContext {
        ServiceContext::new(fitted_preprocessor(), Box::new(RowSum)).unwrap()
    }

    #[test]
    fn test_example_is_valid() {
        example().validate().unwrap();
    }

    #[test]
    fn test_unknown_proximity_rejected() {
        let mut features = example();
        features.ocean_proximity = "LAKE".to_string();
        let err = features.validate().unwrap_err();
        assert_eq!(err.field(), "ocean_proximity");
        assert!(err.to_string().contains("LAKE"));
    }

    #[test]
    fn test_range_checks() {
        let mut features = example();
        features.longitude = -100.0;
        assert_eq!(features.validate().unwrap_err().field(), "longitude");

        let mut features = example();
        features.households = 0.0;
        assert!(matches!(
            features.validate(),
            Err(ValidationError::BelowMinimum { field: "households", .. })
        ));

        let mut features = example();
        features.latitude = f64::NAN;
        assert_eq!(features.validate().unwrap_err().field(), "latitude");

        let mut features = example();
        features.median_income = 0.0;
        features.validate().unwrap();
    }

    #[test]
    fn test_deserialize_request_body() {
        let body = r#"{
            "longitude": -122.23, "latitude": 37.88, "housing_median_age": 41.0,
            "total_rooms": 880.0, "total_bedrooms": 129.0, "population": 322.0,
            "households": 126.0, "median_income": 8.3252, "ocean_proximity": "NEAR BAY"
        }"#;
        let features: HousingFeatures = serde_json::from_str(body).unwrap();
        assert_eq!(features, example());
    }

    #[test]
    fn test_context_requires_fitted_preprocessor() {
        let result = ServiceContext::new(Preprocessor::new("median_house_value"), Box::new(RowSum));
        assert!(matches!(result, Err(PreprocessingError::NotFitted)));
    }

    #[test]
    fn test_predict_batch() {
        let context = context();
        let response = context.predict(&[example(), example()]).unwrap();

        assert_eq!(response.count, 2);
        assert_eq!(response.model_name, "row_sum");
        assert_eq!(response.predictions[0], response.predictions[1]);
        assert_eq!(
            response.feature_names,
            context.preprocessor().feature_names().unwrap()
        );
    }

    #[test]
    fn test_island_is_valid_but_unseen() {
        let context = context();
        let mut features = example();
        features.ocean_proximity = "ISLAND".to_string();
        let prediction = context.predict_one(&features).unwrap();
        assert!(prediction.is_finite());
    }

    #[test]
    fn test_validation_error_is_422() {
        let context = context();
        let mut bad = example();
        bad.total_rooms = 0.0;

        let err = context.predict(&[example(), bad]).unwrap_err();
        assert_eq!(err.status_code(), 422);
        assert!(matches!(err, ServingError::Validation { index: 1, .. }));
        assert_eq!(context.predict(&[]).unwrap_err().status_code(), 422);
    }

    #[test]
    fn test_preprocessing_errors_are_500() {
        let err = ServingError::from(PreprocessingError::NotFitted);
        assert_eq!(err.status_code(), 500);
        let err = ServingError::from(PreprocessingError::missing_column("households"));
        assert_eq!(err.status_code(), 500);

        let context = ServiceContext::new(fitted_preprocessor(), Box::new(Broken)).unwrap();
        let err = context.predict(&[example()]).unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_shared_context_across_threads() {
        let context = Arc::new(context());
        let expected = context.predict_one(&example()).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let context = Arc::clone(&context);
                std::thread::spawn(move || context.predict_one(&example()).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn test_health() {
        let health = context().health();
        assert_eq!(health.status, "healthy");
        assert!(health.model_loaded);
        assert_eq!(health.model_name.as_deref(), Some("row_sum"));
        assert_eq!(health.n_features, 14);
    }

    #[test]
    fn test_from_model_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();

        let empty = ServiceContext::from_model_dir(dir, Box::new(RowSum));
        assert!(matches!(empty, Err(PreprocessingError::IoError(_))));

        fitted_preprocessor()
            .persist(dir.join("preprocessor_20250101_120000.bin"))
            .unwrap();
        let context = ServiceContext::from_model_dir(dir, Box::new(RowSum)).unwrap();
        assert!(context.predict_one(&example()).unwrap().is_finite());
    }
}
