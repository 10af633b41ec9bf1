//! Imputation transformers for handling missing values.
//!
//! | Transformer | Description |
//! |-------------|-------------|
//! | [`SimpleImputer`] | Numeric columns: impute with mean, median or a constant |
//! | [`CategoryImputer`] | Text columns: impute with a fixed sentinel token |

pub mod constant;
pub mod simple;

pub use constant::{
    CategoryImputer, CategoryImputerParams, FittedCategoryImputer, DEFAULT_FILL_VALUE,
};
pub use simple::{FittedSimpleImputer, ImputeStrategy, SimpleImputer, SimpleImputerParams};
