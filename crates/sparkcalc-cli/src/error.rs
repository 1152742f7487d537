use std::path::PathBuf;

use sparkcalc_core::GridError;
use thiserror::Error;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid sheet JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),
}
