use fcat_esi::{ErrorClass, GatewayError};
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Poll did not finish within {0:?}")]
    Deadline(Duration),

    #[error("Poll worker failed: {0}")]
    Worker(String),

    #[error("Refresh scheduler is not running")]
    Closed,
}

impl SyncError {
    /// Whether the next scheduled poll is expected to recover.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Gateway(err) => err.class() != ErrorClass::Auth,
            Self::Deadline(_) | Self::Worker(_) => true,
            Self::Closed => false,
        }
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Worker(err.to_string())
    }
}
