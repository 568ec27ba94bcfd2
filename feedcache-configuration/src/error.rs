use thiserror::Error;

/// Errors raised while reading configuration or building stores from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML document could not be parsed.
    #[error(transparent)]
    Parse(#[from] serde_saphyr::Error),

    /// The store type is compiled out or the store could not be opened.
    #[error("store backend not available: {0}")]
    BackendNotAvailable(String),

    /// The maximum cache age does not fit a timestamp offset.
    #[error("max cache age out of range: {0:?}")]
    InvalidMaxAge(std::time::Duration),

    /// The feed and image file stores point at the same file.
    #[error("feed and image stores share the file {}", .0.display())]
    SharedFilePath(std::path::PathBuf),
}
