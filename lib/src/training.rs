//! Training-side driver: split, fit on the training rows only, transform the
//! holdout with the frozen state.

use crate::config::PipelineConfig;
use crate::dataset::{DatasetSplitter, Table};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::preprocessor::Preprocessor;
use crate::preprocessing::schema::ColumnClassifier;
use ndarray::{Array1, Array2};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::info;

/// File prefix of persisted preprocessors.
pub const PREPROCESSOR_PREFIX: &str = "preprocessor_";

/// File extension of persisted preprocessors.
pub const ARTIFACT_EXTENSION: &str = "bin";

/// Matrices and targets ready for model training.
#[derive(Debug)]
pub struct PreparedData {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
    pub feature_names: Vec<String>,
    /// Fitted on the training rows; persist it next to the model.
    pub preprocessor: Preprocessor,
}

/// Split `table`, fit a preprocessor on the training split and transform both.
pub fn prepare_data_for_training(
    table: &Table,
    config: &PipelineConfig,
) -> Result<PreparedData, PreprocessingError> {
    config.validate()?;
    let classifier = ColumnClassifier::new(config.target_column.as_str());
    // Fail on a bad target before any work is done
    classifier.target_values(table)?;

    let (train, test) = DatasetSplitter::new(config.test_size, config.random_state)?.split(table)?;

    let mut preprocessor = Preprocessor::new(config.target_column.as_str())
        .with_fill_value(config.categorical_fill_value.as_str());
    let x_train = preprocessor.fit_transform(&train)?;
    let x_test = preprocessor.transform(&test)?;
    let y_train = classifier.target_values(&train)?;
    let y_test = classifier.target_values(&test)?;
    let feature_names = preprocessor.feature_names()?.to_vec();

    info!(
        train_shape = ?x_train.dim(),
        test_shape = ?x_test.dim(),
        features = feature_names.len(),
        "data prepared for training"
    );

    Ok(PreparedData {
        x_train,
        x_test,
        y_train,
        y_test,
        feature_names,
        preprocessor,
    })
}

/// Newest `{prefix}*.bin` file in `dir` by modification time, if any.
pub fn latest_artifact<P: AsRef<Path>>(
    dir: P,
    prefix: &str,
) -> Result<Option<PathBuf>, PreprocessingError> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(prefix))
            .unwrap_or(false)
            && path.extension().and_then(|ext| ext.to_str()) == Some(ARTIFACT_EXTENSION);
        if !matches || !path.is_file() {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        if newest.as_ref().map_or(true, |(time, _)| modified > *time) {
            newest = Some((modified, path));
        }
    }
    Ok(newest.map(|(_, path)| path))
}
