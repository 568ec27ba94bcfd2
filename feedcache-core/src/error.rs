//! Error type delivered to loader completions.

use thiserror::Error;

/// Result delivered by every loader and cache operation.
pub type LoadResult<T> = Result<T, LoadError>;

/// Failure of a load or save.
///
/// Cancellation is not an error: a cancelled operation delivers nothing.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The local store failed (I/O, decoding, database).
    ///
    /// Carries the backend's own error so callers can inspect it.
    #[error("store failure: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// No image data is cached for the requested URL.
    #[error("image data not found")]
    NotFound,

    /// The image data store failed while loading.
    #[error("image data store failed")]
    Failed,

    /// The remote source could not be reached.
    #[error("connectivity error")]
    Connectivity,

    /// The remote source answered with something that could not be used.
    #[error("invalid data")]
    InvalidData,
}

impl LoadError {
    /// Wraps a backend error.
    pub fn store<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(error))
    }

    /// Returns `true` for failures of the local store.
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}
