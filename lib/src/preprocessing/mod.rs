//! Data preprocessing for the housing model.
//!
//! Every learned component follows the same two-state pattern: an unfitted
//! [`Transformer`] holds configuration, and `fit` returns a distinct
//! [`FittedTransformer`] whose parameters are frozen and serializable.
//!
//! # Components
//!
//! - [`DerivedFeatureComputer`]: stateless ratio features
//! - [`ColumnClassifier`] / [`Schema`]: feature/target split and column kinds
//! - [`NumericTransformer`]: median imputation + standardization
//! - [`CategoricalTransformer`]: sentinel imputation + one-hot encoding
//! - [`Preprocessor`]: the composition, with persist/reload
//!
//! The building blocks ([`SimpleImputer`], [`CategoryImputer`],
//! [`StandardScaler`], [`OneHotEncoder`]) are usable on their own.
//!
//! # Example
//!
//! ```ignore
//! use housing_prep::dataset::Table;
//! use housing_prep::preprocessing::Preprocessor;
//!
//! let train = Table::from_csv_path("data/housing.csv")?;
//! let mut preprocessor = Preprocessor::new("median_house_value");
//! let x_train = preprocessor.fit_transform(&train)?;
//!
//! // Save for later use
//! preprocessor.persist("models/preprocessor.bin")?;
//!
//! // Later, load and transform new data
//! let loaded = Preprocessor::load_from_file("models/preprocessor.bin")?;
//! let x_new = loaded.transform(&new_data)?;
//! ```

pub mod categorical;
pub mod encoding;
pub mod error;
pub mod feature_engineering;
pub mod imputation;
pub mod numeric;
pub mod preprocessor;
pub mod scaling;
pub mod schema;
pub mod state;
pub mod traits;

// Re-export main types
pub use categorical::{
    CategoricalTransformer, CategoricalTransformerParams, FittedCategoricalTransformer,
};
pub use encoding::{FittedOneHotEncoder, HandleUnknown, OneHotEncoder, OneHotEncoderParams};
pub use error::PreprocessingError;
pub use feature_engineering::{DerivedFeatureComputer, DERIVED_COLUMNS, SOURCE_COLUMNS};
pub use imputation::{
    CategoryImputer, CategoryImputerParams, FittedCategoryImputer, FittedSimpleImputer,
    ImputeStrategy, SimpleImputer, SimpleImputerParams, DEFAULT_FILL_VALUE,
};
pub use numeric::{FittedNumericTransformer, NumericTransformer, NumericTransformerParams};
pub use preprocessor::{Preprocessor, PreprocessorStatus};
pub use scaling::{FittedStandardScaler, StandardScaler, StandardScalerParams};
pub use schema::{Classification, ColumnClassifier, ColumnKind, Schema, SchemaColumn};
pub use state::{FittedPreprocessorState, STATE_FORMAT_VERSION};
pub use traits::{FittedTransformer, Transformer};
