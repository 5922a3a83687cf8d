//! Error types for junops

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for junops
#[derive(Error, Debug)]
pub enum OpsError {
    #[error("File doesn't exist: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Header/field '{0}' doesn't exist in CSV file")]
    MissingField(String),

    #[error("Malformed target: {0}")]
    MalformedTarget(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Cannot connect to device {target}: {reason}")]
    ConnectionFailed { target: String, reason: String },

    #[error("Operation failed on device {target}: {reason}")]
    RemoteOperationFailed { target: String, reason: String },

    #[error("Cannot write output file {}: {}", .path.display(), .reason)]
    OutputNotWritable { path: PathBuf, reason: String },

    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for OpsError {
    fn from(err: anyhow::Error) -> Self {
        OpsError::Internal(err.to_string())
    }
}
