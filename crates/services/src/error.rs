//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors talking to the node. All of them are retryable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("node request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("node returned an error: {0}")]
    Rpc(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by the validation session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("not every flip has been answered")]
    NotReady,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
