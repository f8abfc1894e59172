use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("failed to encode value for key '{key}': {reason}")]
    Encode { key: String, reason: String },

    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}
