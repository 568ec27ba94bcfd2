//! Record encodings for stores that persist serialized bytes.
//!
//! - [`JsonFormat`] - human readable, the default; handy when inspecting a store file
//! - [`BincodeFormat`] - compact binary encoding for production
//!
//! Decoding failures are reported as [`FormatError::Deserialize`] so a
//! corrupt store surfaces as an error instead of an empty cache.

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

mod bincode;
mod json;

pub use bincode::BincodeFormat;
pub use json::JsonFormat;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("failed to encode record: {0}")]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to decode record: {0}")]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

/// Encoding of store records to and from bytes.
pub trait Format: std::fmt::Debug + Clone + Send + Sync + 'static {
    /// Encodes `value`.
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, FormatError>
    where
        T: Serialize + ?Sized;

    /// Decodes a value previously produced by [`Format::encode`].
    fn decode<T>(&self, data: &[u8]) -> Result<T, FormatError>
    where
        T: DeserializeOwned;
}
