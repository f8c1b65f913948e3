// src/errors.rs

//! Crate-wide error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundlewatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("malformed descriptor {path:?}: {source}")]
    MalformedDescriptor {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("build pipeline failed for bundle '{bundle}': {source}")]
    PipelineFailure {
        bundle: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BundlewatchError>;
