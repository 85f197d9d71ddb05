//! Error types for logleaf-core

use thiserror::Error;

use crate::config::ConfigError;
use crate::db::StoreError;
use crate::models::LeafError;
use crate::qiita::FetchError;
use crate::sync::SyncError;

/// Result type alias using logleaf-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in logleaf-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Domain invariant violation
    #[error(transparent)]
    Validation(#[from] LeafError),

    /// Leaf store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// External item source failure
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Run-fatal sync failure
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether this error means the addressed leaf does not exist.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(StoreError::NotFound(_)))
    }
}
