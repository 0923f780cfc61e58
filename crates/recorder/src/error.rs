//! Error types for the recorder

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error(transparent)]
    Common(#[from] wdrecorder_common::Error),

    #[error("Template not found: {0}")]
    TemplateNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Worker result {path} could not be read: {reason}")]
    CorruptWorkerResult { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type RecorderResult<T> = Result<T, RecorderError>;
