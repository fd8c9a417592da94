use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] revsync_core::Error),
    #[error(transparent)]
    Sync(#[from] revsync_core::SyncError),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Sync failed: {0}")]
    SyncFailed(String),
    #[error("Nothing to update. Pass --api-key, --place-id or --frequency.")]
    NothingToUpdate,
}
