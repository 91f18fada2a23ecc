use thiserror::Error;

/// Errors raised by storage, configuration and server startup.
#[derive(Error, Debug)]
pub enum Error {
    /// No artist row has this id
    #[error("Artist {0} not found")]
    NotFound(i64),

    /// Any `DuckDB` failure
    #[error("Storage error: {0}")]
    StorageError(#[from] async_duckdb::Error),

    /// A row that cannot be turned into an `Artist`
    #[error("Corrupted artist row: {0}")]
    CorruptedRow(String),

    /// Unreadable environment or settings
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Socket bind or serve failure
    #[error("Server error: {0}")]
    ServerError(#[from] std::io::Error),
}

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Error::ConfigurationError(err.to_string())
    }
}

/// Result alias defaulting to this crate's `Error`
pub type Result<T, E = Error> = std::result::Result<T, E>;
