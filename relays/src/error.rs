//! Relay dataset error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay dataset unavailable at {path}: {source}")]
    DataUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("relay dataset is malformed: {0}")]
    Parse(#[from] serde_json::Error),
}
