//! Categorical feature encoding transformers.
//!
//! ## OneHotEncoder
//! Converts string categories to one-hot (dummy) encoding.
//!
//! ```ignore
//! // Input: [["INLAND", "NEAR BAY", "INLAND"]]  (1 categorical feature, 3 samples)
//! // Output: [[1,0], [0,1], [1,0]]  (3 samples, 2 binary features)
//! ```

mod one_hot;

pub use one_hot::{FittedOneHotEncoder, OneHotEncoder, OneHotEncoderParams};

/// Strategy for handling unknown categories during transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum HandleUnknown {
    /// Raise an error when unknown categories are encountered.
    #[default]
    Error,
    /// Ignore unknown categories (output an all-zero block).
    Ignore,
}
