use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatLogError>;

#[derive(Error, Debug)]
pub enum ChatLogError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid pattern for {name:?}: {source}")]
    Pattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}
