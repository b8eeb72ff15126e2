//! Loader errors — description-file problems plus everything the core can
//! raise during the build pass.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoaderError>;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse detector description: {0}")]
    Parse(String),

    #[error("invalid detector description: {0}")]
    Validation(String),

    #[error(transparent)]
    Core(#[from] det_id::Error),
}
