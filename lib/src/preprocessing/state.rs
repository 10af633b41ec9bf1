//! Learned preprocessor state and its versioned on-disk envelope.
//!
//! The envelope is bincode-encoded:
//!
//! | Field | Type | Meaning |
//! |-------|------|---------|
//! | `magic` | `[u8; 9]` | always `b"HPRPSTATE"` |
//! | `format_version` | `u32` | [`STATE_FORMAT_VERSION`] at write time |
//! | `payload` | `Vec<u8>` | bincode-encoded [`FittedPreprocessorState`] |
//!
//! The version is checked before the payload is decoded, so a blob from an
//! incompatible build fails with
//! [`PreprocessingError::IncompatibleStateVersion`] instead of producing a
//! matrix of the wrong width.

use crate::preprocessing::categorical::CategoricalTransformerParams;
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::numeric::NumericTransformerParams;
use crate::preprocessing::schema::Schema;
use serde::{Deserialize, Serialize};

/// Version of the persisted state layout.
pub const STATE_FORMAT_VERSION: u32 = 1;

const STATE_MAGIC: [u8; 9] = *b"HPRPSTATE";

#[derive(Serialize, Deserialize)]
struct StateEnvelope {
    magic: [u8; 9],
    format_version: u32,
    payload: Vec<u8>,
}

/// Everything `transform` needs, frozen at fit time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedPreprocessorState {
    /// Target column, ignored when present at transform time.
    pub target_column: String,
    /// Feature schema, including derived columns.
    pub schema: Schema,
    /// Median fill values and scaling parameters.
    pub numeric: NumericTransformerParams,
    /// Fill token and vocabularies.
    pub categorical: CategoricalTransformerParams,
    /// Columns copied untouched after the encoded blocks.
    pub passthrough: Vec<String>,
    /// Output column names, in matrix order.
    pub feature_names: Vec<String>,
}

impl FittedPreprocessorState {
    /// Output matrix width.
    pub fn n_features_out(&self) -> usize {
        self.feature_names.len()
    }

    /// Check that the parts of the state agree with each other.
    pub fn check_consistency(&self) -> Result<(), PreprocessingError> {
        let n_numeric = self.numeric.columns.len();
        let n_encoded: usize = self
            .categorical
            .encoder
            .categories
            .iter()
            .map(Vec::len)
            .sum();
        let expected = n_numeric + n_encoded + self.passthrough.len();
        if expected != self.feature_names.len() {
            return Err(PreprocessingError::SerializationError(format!(
                "state lists {} feature names but its blocks produce {}",
                self.feature_names.len(),
                expected
            )));
        }

        let blocks = [
            (&self.numeric.columns, self.schema.numeric()),
            (&self.categorical.columns, self.schema.categorical()),
            (&self.passthrough, self.schema.passthrough()),
        ];
        if blocks.iter().any(|(columns, declared)| *columns != declared) {
            return Err(PreprocessingError::SerializationError(
                "state column blocks disagree with its schema".to_string(),
            ));
        }
        Ok(())
    }

    /// Encode into a versioned blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PreprocessingError> {
        let envelope = StateEnvelope {
            magic: STATE_MAGIC,
            format_version: STATE_FORMAT_VERSION,
            payload: bincode::serialize(self)?,
        };
        Ok(bincode::serialize(&envelope)?)
    }

    /// Decode a versioned blob written by [`FittedPreprocessorState::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PreprocessingError> {
        let envelope: StateEnvelope = bincode::deserialize(bytes).map_err(|e| {
            PreprocessingError::SerializationError(format!("not a preprocessor state: {}", e))
        })?;
        if envelope.magic != STATE_MAGIC {
            return Err(PreprocessingError::SerializationError(
                "not a preprocessor state: bad magic".to_string(),
            ));
        }
        if envelope.format_version != STATE_FORMAT_VERSION {
            return Err(PreprocessingError::IncompatibleStateVersion {
                expected: STATE_FORMAT_VERSION,
                found: envelope.format_version,
            });
        }

        let state: Self = bincode::deserialize(&envelope.payload)?;
        state.check_consistency()?;
        Ok(state)
    }
}
