//! Serialization of fitted preprocessing parameters.
//!
//! Fitted components expose their learned state as plain data (`Vec<f64>`,
//! strings, scalars) so it can be written to disk without coupling to the
//! in-memory representation used during transform.

use std::error::Error;

/// A trait for parameter representations that can be serialized to and from bytes.
///
/// Implementors should contain only plain data, never matrices borrowed from
/// a live transformer.
pub trait SerializableParams: Sized {
    /// The error type returned during (de)serialization.
    type Error: Error + Send + Sync + 'static;

    /// Serialize the parameters into a byte buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error>;

    /// Deserialize the parameters from a byte buffer.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}

impl<T> SerializableParams for T
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Medians {
        columns: Vec<String>,
        values: Vec<f64>,
    }

    #[test]
    fn test_params_bytes_roundtrip() {
        let params = Medians {
            columns: vec!["total_rooms".to_string()],
            values: vec![2127.0],
        };
        let bytes = params.to_bytes().unwrap();
        let restored = Medians::from_bytes(&bytes).unwrap();
        assert_eq!(restored, params);
    }

    #[test]
    fn test_params_truncated_bytes() {
        let params = Medians {
            columns: vec!["population".to_string()],
            values: vec![1166.0],
        };
        let bytes = params.to_bytes().unwrap();
        assert!(Medians::from_bytes(&bytes[..bytes.len() / 2]).is_err());
    }
}
