use feoxdb::FeoxError;
use thiserror::Error;

/// Failure to open a [`FeOxDbStore`](crate::FeOxDbStore).
#[derive(Debug, Error)]
pub enum FeOxDbError {
    /// FeOxDB refused to open or create the database.
    #[error("cannot open FeOxDB database: {0}")]
    Open(#[from] FeoxError),

    /// Creating the database directory or starting the worker thread failed.
    #[error("cannot start FeOxDB store: {0}")]
    Io(#[from] std::io::Error),
}
