//! Error types for store operations.

use feedcache_core::LoadError;
use thiserror::Error;

use crate::format::FormatError;

/// Error type for store operations.
///
/// Store errors are always propagated to the calling component, never
/// swallowed by the store itself.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error while reading, writing or removing a store file.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be encoded, or the persisted bytes could not be
    /// decoded.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Internal error of the storage engine.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),

    /// The store was shut down and no longer accepts operations.
    #[error("store is closed")]
    Closed,
}

impl StoreError {
    /// Wraps an engine specific error.
    pub fn internal<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal(Box::new(error))
    }

    /// Returns `true` when persisted bytes could not be decoded.
    pub fn is_decoding(&self) -> bool {
        matches!(self, Self::Format(FormatError::Deserialize(_)))
    }
}

impl From<StoreError> for LoadError {
    fn from(error: StoreError) -> Self {
        LoadError::store(error)
    }
}
