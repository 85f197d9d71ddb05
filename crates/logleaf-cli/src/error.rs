use logleaf_core::config::ConfigError;
use logleaf_core::db::StoreError;
use logleaf_core::sync::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] logleaf_core::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Leaf ID cannot be empty")]
    EmptyLeafId,
    #[error(
        "Qiita sync is not configured. Set QIITA_USER and QIITA_TOKEN in the environment or a .env file."
    )]
    SyncNotConfigured,
}
