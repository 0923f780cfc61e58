//! Error types for WDRecorder

use thiserror::Error;

/// Result type alias using WDRecorder Error
pub type Result<T> = std::result::Result<T, Error>;

/// WDRecorder error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Refusing to write outside the report directory: {0}")]
    UnsafePath(String),

    #[error("Resource not found: {kind} with id {id}")]
    NotFound { kind: String, id: String },
}
