//! # housing-prep
//!
//! A deterministic feature-engineering pipeline for tabular housing data,
//! with a strict separation between fitting and inference.
//!
//! ## Core Design Principles
//!
//! - **Fit once, replay everywhere**: every statistic (medians, means,
//!   standard deviations, vocabularies) is learned by `fit` on the training
//!   split and frozen. `transform` only reads it.
//! - **Stable output layout**: the set and order of output columns never
//!   depends on which categories appear in later data.
//! - **Typed failures**: schema drift, unfitted use and incompatible
//!   persisted state are distinct [`PreprocessingError`] variants.
//! - **Persisted state is the source of truth**: a reloaded preprocessor
//!   transforms exactly like the instance that was saved.
//!
//! ## Quick Start
//!
//! ```ignore
//! use housing_prep::config::PipelineConfig;
//! use housing_prep::dataset::Table;
//! use housing_prep::training::prepare_data_for_training;
//!
//! let config = PipelineConfig::from_json_file("config.json")?;
//! let table = Table::from_csv_path(&config.data_file)?;
//!
//! let prepared = prepare_data_for_training(&table, &config)?;
//! // prepared.x_train / prepared.y_train feed the model,
//! // prepared.preprocessor is persisted next to it.
//! prepared.preprocessor.persist("models/preprocessor.bin")?;
//! ```
//!
//! ## Module Structure
//!
//! - `dataset`: in-memory tables, CSV ingestion, seeded train/test split
//! - `preprocessing`: derived features, column classification, imputation,
//!   scaling, one-hot encoding and the composed [`Preprocessor`]
//! - `config`: JSON pipeline configuration
//! - `training`: the training-side driver
//! - `serving`: request validation and the shared prediction context
//! - `serialization`: byte round-trips for fitted parameters

/// Pipeline configuration.
pub mod config;

/// Tabular data and dataset partitioning.
pub mod dataset;

/// Feature engineering and preprocessing transformers.
pub mod preprocessing;

/// Parameter persistence.
pub mod serialization;

/// Request validation and prediction context for the serving layer.
pub mod serving;

/// Data preparation for model training.
pub mod training;

pub use config::PipelineConfig;
pub use dataset::{Record, Table, Value};
pub use preprocessing::{Preprocessor, PreprocessorStatus, PreprocessingError};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::prepare_data_for_training;

    const CSV: &str = "\
longitude,latitude,housing_median_age,total_rooms,total_bedrooms,\
population,households,median_income,median_house_value,ocean_proximity
-122.23,37.88,41.0,880.0,129.0,322.0,126.0,8.3252,452600.0,NEAR BAY
-122.22,37.86,21.0,7099.0,1106.0,2401.0,1138.0,8.3014,358500.0,NEAR BAY
-122.24,37.85,52.0,1467.0,,496.0,177.0,7.2574,352100.0,NEAR BAY
-121.25,38.52,16.0,2330.0,433.0,1270.0,0.0,3.5625,118200.0,INLAND
-119.78,36.76,27.0,2516.0,527.0,1563.0,502.0,2.6114,72900.0,INLAND
-118.41,34.02,33.0,3110.0,600.0,1300.0,580.0,6.1150,500001.0,<1H OCEAN
-117.16,32.72,45.0,1962.0,480.0,1050.0,455.0,2.8990,205300.0,NEAR OCEAN
-118.28,34.05,38.0,2600.0,650.0,2400.0,620.0,2.1500,187500.0,<1H OCEAN
-121.89,37.33,29.0,2900.0,610.0,1750.0,590.0,4.4000,265000.0,
-120.65,35.28,18.0,2050.0,390.0,980.0,360.0,3.7000,241000.0,NEAR OCEAN
";

    #[test]
    fn test_csv_to_matrices_and_back() {
        let table = Table::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.n_rows(), 10);

        let config = PipelineConfig::default().with_test_size(0.3);
        let prepared = prepare_data_for_training(&table, &config).unwrap();

        assert_eq!(prepared.x_train.nrows(), 7);
        assert_eq!(prepared.x_test.nrows(), 3);
        assert!(prepared.x_train.iter().all(|v| v.is_finite()));
        assert!(prepared.x_test.iter().all(|v| v.is_finite()));

        let bytes = prepared.preprocessor.to_bytes().unwrap();
        let restored = Preprocessor::from_bytes(&bytes).unwrap();
        assert_eq!(restored.status(), PreprocessorStatus::Reloaded);
        assert_eq!(
            restored.transform(&table).unwrap(),
            prepared.preprocessor.transform(&table).unwrap()
        );
    }

    #[test]
    fn test_empty_proximity_cell_becomes_sentinel() {
        let table = Table::from_csv_reader(CSV.as_bytes()).unwrap();
        let mut preprocessor = Preprocessor::new("median_house_value");
        preprocessor.fit_transform(&table).unwrap();

        let names = preprocessor.feature_names().unwrap();
        assert!(names.iter().any(|n| n == "ocean_proximity_missing"));
        assert!(!names.iter().any(|n| n == "ocean_proximity_ISLAND"));
    }
}
