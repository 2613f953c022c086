// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, UtilitiesError>;

#[derive(Error, Debug)]
pub enum UtilitiesError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not create log directory {path}: {source}")]
    LogDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Email error: {0}")]
    Email(String),

    #[error("Geoprocessing toolkit error: {0}")]
    Toolkit(String),

    #[error("Failed to install subscriber: {0}")]
    Subscriber(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lettre::address::AddressError> for UtilitiesError {
    fn from(err: lettre::address::AddressError) -> Self {
        UtilitiesError::Email(err.to_string())
    }
}

impl From<lettre::error::Error> for UtilitiesError {
    fn from(err: lettre::error::Error) -> Self {
        UtilitiesError::Email(err.to_string())
    }
}
