// src/error.rs
// Error types for the panel, split per layer.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure of one daemon call.
///
/// The `Display` output is the bare message shown to the operator, so
/// neither variant adds a prefix.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response: unreachable daemon or a
    /// client that could not be built.
    #[error("{0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    /// The daemon answered with a non-success status. `message` is the
    /// server-supplied `error` field, or `HTTP <status>` when there is none.
    #[error("{message}")]
    Status { status: u16, message: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Reqwest(e) => e.status().map(|s| s.as_u16()),
            ApiError::Endpoint(_) => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid panel URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    #[error("no token given: pass --token or a panel URL containing ?t=<token>")]
    MissingToken,
}

// Define a type alias for Result using our AppError
pub type Result<T> = std::result::Result<T, AppError>;
