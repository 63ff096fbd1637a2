//! Error types for the wikidex core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WikidexError>;

#[derive(Error, Debug)]
pub enum WikidexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("flush failed, pending batch retained: {0}")]
    FlushFailed(String),

    #[error("document not found: {0}")]
    DocNotFound(u64),

    #[error("token not found: {0}")]
    TokenNotFound(String),

    #[error("document source failed: {0}")]
    SourceFailed(String),

    #[error("corrupted record: {0}")]
    Corruption(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<bincode::Error> for WikidexError {
    fn from(err: bincode::Error) -> Self {
        WikidexError::Serialization(err.to_string())
    }
}

impl From<crate::storage::checksum::ChecksumError> for WikidexError {
    fn from(err: crate::storage::checksum::ChecksumError) -> Self {
        WikidexError::Corruption(err.to_string())
    }
}
