//! The housing preprocessor: one fit/transform unit over raw tables.
//!
//! ```text
//! raw table -> derived features -> schema check -> [numeric | categorical | passthrough]
//! ```
//!
//! Lifecycle:
//! ```text
//! Unfitted --fit_transform--> Fitted
//!     |                         |
//!     +--------reload-----------+--> Reloaded
//! ```
//!
//! `transform` borrows the preprocessor immutably and never mutates the
//! learned state, so a fitted instance can be shared between threads.

use crate::dataset::{Record, Table};
use crate::preprocessing::categorical::{CategoricalTransformer, FittedCategoricalTransformer};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::feature_engineering::{DerivedFeatureComputer, SOURCE_COLUMNS};
use crate::preprocessing::imputation::DEFAULT_FILL_VALUE;
use crate::preprocessing::numeric::{numeric_matrix, FittedNumericTransformer, NumericTransformer};
use crate::preprocessing::schema::{ColumnClassifier, Schema};
use crate::preprocessing::state::FittedPreprocessorState;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{concatenate, Array2, Axis};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Where a preprocessor's learned state came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreprocessorStatus {
    Unfitted,
    /// Fitted in this process by `fit_transform`.
    Fitted,
    /// Restored from persisted state.
    Reloaded,
}

/// Fitted blocks, rebuilt from the state so that the state alone drives
/// every transform.
#[derive(Clone, Debug)]
struct FittedBlocks {
    state: FittedPreprocessorState,
    numeric: FittedNumericTransformer,
    categorical: FittedCategoricalTransformer,
}

impl FittedBlocks {
    fn from_state(state: FittedPreprocessorState) -> Result<Self, PreprocessingError> {
        state.check_consistency()?;
        let numeric = FittedNumericTransformer::from_params(state.numeric.clone())?;
        let categorical = FittedCategoricalTransformer::from_params(state.categorical.clone())?;
        Ok(Self {
            state,
            numeric,
            categorical,
        })
    }

    /// Numeric block, then categorical block, then passthrough columns.
    fn apply(&self, derived: &Table) -> Result<Array2<f64>, PreprocessingError> {
        let numeric = self.numeric.transform(derived)?;
        let categorical = self.categorical.transform(derived)?;
        let passthrough = numeric_matrix(derived, &self.state.passthrough)?;

        concatenate(
            Axis(1),
            &[numeric.view(), categorical.view(), passthrough.view()],
        )
        .map_err(|e| PreprocessingError::InvalidParameter(format!("block shapes differ: {}", e)))
    }
}

/// Derived features, numeric imputation and scaling, categorical imputation
/// and one-hot encoding, composed into one fitted unit.
///
/// # Example
/// ```ignore
/// use housing_prep::preprocessing::Preprocessor;
///
/// let mut preprocessor = Preprocessor::new("median_house_value");
/// let x_train = preprocessor.fit_transform(&train)?;
/// let x_test = preprocessor.transform(&test)?;
///
/// preprocessor.persist("models/preprocessor.bin")?;
/// let restored = Preprocessor::load_from_file("models/preprocessor.bin")?;
/// assert_eq!(restored.transform(&test)?, x_test);
/// ```
#[derive(Clone, Debug)]
pub struct Preprocessor {
    target_column: String,
    fill_value: String,
    declared_schema: Option<Schema>,
    required_columns: Vec<String>,
    derived: DerivedFeatureComputer,
    status: PreprocessorStatus,
    fitted: Option<FittedBlocks>,
}

impl Preprocessor {
    /// Unfitted preprocessor predicting `target_column`.
    pub fn new(target_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
            fill_value: DEFAULT_FILL_VALUE.to_string(),
            declared_schema: None,
            required_columns: SOURCE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            derived: DerivedFeatureComputer::new(),
            status: PreprocessorStatus::Unfitted,
            fitted: None,
        }
    }

    /// Sentinel for missing categories.
    pub fn with_fill_value(mut self, fill_value: impl Into<String>) -> Self {
        self.fill_value = fill_value.into();
        self
    }

    /// Use a declared schema instead of classifying columns by value type.
    ///
    /// The schema describes the feature table after derivation, so it must
    /// list the derived columns too.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.declared_schema = Some(schema);
        self
    }

    /// Raw columns that must be present at fit time.
    pub fn with_required_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    pub fn status(&self) -> PreprocessorStatus {
        self.status
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// The fitted schema, or the declared one before fitting.
    pub fn schema(&self) -> Option<&Schema> {
        match &self.fitted {
            Some(blocks) => Some(&blocks.state.schema),
            None => self.declared_schema.as_ref(),
        }
    }

    pub fn state(&self) -> Result<&FittedPreprocessorState, PreprocessingError> {
        self.fitted
            .as_ref()
            .map(|blocks| &blocks.state)
            .ok_or(PreprocessingError::NotFitted)
    }

    /// Output column names, in matrix order.
    pub fn feature_names(&self) -> Result<&[String], PreprocessingError> {
        Ok(&self.state()?.feature_names)
    }

    pub fn n_features_out(&self) -> Result<usize, PreprocessingError> {
        Ok(self.state()?.n_features_out())
    }

    /// Learn all statistics from `table` and return its transformed matrix.
    ///
    /// On error the previous state, if any, is kept unchanged.
    pub fn fit_transform(&mut self, table: &Table) -> Result<Array2<f64>, PreprocessingError> {
        if table.is_empty() {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit Preprocessor on an empty table".to_string(),
            ));
        }
        if let Some(missing) = self
            .required_columns
            .iter()
            .find(|c| !table.contains(c.as_str()))
        {
            return Err(PreprocessingError::Configuration(format!(
                "required input column '{}' not found",
                missing
            )));
        }

        let derived = self.derived.compute(table);
        info!(columns = derived.n_columns(), "derived features created");

        let classification = ColumnClassifier::new(self.target_column.as_str()).classify(&derived)?;
        let schema = match &self.declared_schema {
            Some(schema) => schema.clone(),
            None => classification.schema(),
        };
        schema.validate(&classification.features, None)?;

        let features = &classification.features;
        let numeric = NumericTransformer::new(schema.numeric()).fit(features)?;
        let categorical = CategoricalTransformer::new(schema.categorical())
            .with_fill_value(self.fill_value.clone())
            .fit(features)?;
        let passthrough = schema.passthrough();

        let mut feature_names = numeric.columns().to_vec();
        feature_names.extend_from_slice(categorical.feature_names());
        feature_names.extend(passthrough.iter().cloned());

        let state = FittedPreprocessorState {
            target_column: self.target_column.clone(),
            schema,
            numeric: numeric.extract_params(),
            categorical: categorical.extract_params(),
            passthrough,
            feature_names,
        };
        let blocks = FittedBlocks {
            state,
            numeric,
            categorical,
        };
        let output = blocks.apply(features)?;

        info!(
            rows = output.nrows(),
            features = output.ncols(),
            numeric = blocks.numeric.n_features_out(),
            categorical = blocks.categorical.n_features_out(),
            "preprocessor fitted"
        );

        self.fitted = Some(blocks);
        self.status = PreprocessorStatus::Fitted;
        Ok(output)
    }

    /// Transform `table` with the frozen state.
    ///
    /// The target column may be present and is ignored. All-or-nothing: any
    /// schema problem fails the whole call.
    pub fn transform(&self, table: &Table) -> Result<Array2<f64>, PreprocessingError> {
        let blocks = self.fitted.as_ref().ok_or(PreprocessingError::NotFitted)?;

        let derived = self.derived.compute(table);
        blocks
            .state
            .schema
            .validate(&derived, Some(&blocks.state.target_column))?;
        let output = blocks.apply(&derived)?;

        debug!(rows = output.nrows(), features = output.ncols(), "table transformed");
        Ok(output)
    }

    /// Transform raw records, e.g. a batch of serving requests.
    pub fn transform_records(&self, records: &[Record]) -> Result<Array2<f64>, PreprocessingError> {
        let width = self.n_features_out()?;
        if records.is_empty() {
            return Ok(Array2::zeros((0, width)));
        }
        let table = Table::from_records(records)?;
        self.transform(&table)
    }

    /// Encode the fitted state as a versioned blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PreprocessingError> {
        self.state()?.to_bytes()
    }

    /// Restore a preprocessor from a blob written by [`Preprocessor::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PreprocessingError> {
        Self::from_state(FittedPreprocessorState::from_bytes(bytes)?)
    }

    fn from_state(state: FittedPreprocessorState) -> Result<Self, PreprocessingError> {
        let blocks = FittedBlocks::from_state(state)?;
        let mut preprocessor = Self::new(blocks.state.target_column.clone())
            .with_fill_value(blocks.categorical.fill_value());
        preprocessor.fitted = Some(blocks);
        preprocessor.status = PreprocessorStatus::Reloaded;
        Ok(preprocessor)
    }

    /// Write the fitted state to `path`.
    ///
    /// The blob goes to a sibling temporary file first and is renamed into
    /// place, so readers never see a partial file.
    pub fn persist<P: AsRef<Path>>(&self, path: P) -> Result<(), PreprocessingError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        write_atomically(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "preprocessor persisted");
        Ok(())
    }

    /// Load a persisted preprocessor. The result is in the `Reloaded` state.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PreprocessingError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let preprocessor = Self::from_bytes(&bytes)?;
        info!(
            path = %path.display(),
            features = preprocessor.n_features_out()?,
            "preprocessor loaded"
        );
        Ok(preprocessor)
    }

    /// Replace this instance's state with a persisted one.
    ///
    /// On error the current state is kept.
    pub fn reload<P: AsRef<Path>>(&mut self, path: P) -> Result<(), PreprocessingError> {
        let loaded = Self::load_from_file(path)?;
        *self = Self {
            required_columns: std::mem::take(&mut self.required_columns),
            ..loaded
        };
        Ok(())
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp_name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("preprocessor"));
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let result = (|| -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        writer.write_all(bytes)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
