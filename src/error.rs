//! Error types for typetester

use thiserror::Error;

/// Broad classification used by callers to decide between rejecting input
/// and tearing the session down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    OutOfRange,
    Fatal,
}

/// Crate error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Typed buffer of length {typed} exceeds phrase length {phrase}")]
    OutOfRange { typed: usize, phrase: usize },

    #[error("Random source unavailable: {0}")]
    Entropy(#[from] rand::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::OutOfRange { .. } => ErrorKind::OutOfRange,
            Error::Entropy(_) | Error::Io(_) | Error::Json(_) => ErrorKind::Fatal,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
