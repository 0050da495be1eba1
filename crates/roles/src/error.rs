use thiserror::Error;

pub type Result<T> = std::result::Result<T, RoleCacheError>;

#[derive(Error, Debug)]
pub enum RoleCacheError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
