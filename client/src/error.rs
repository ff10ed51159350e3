use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading configuration or classroom data.
#[derive(Debug, Error)]
pub enum Error {
    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Dataset is not valid JSON or does not match the expected shape.
    #[error("invalid dataset: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file is not valid TOML.
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Config parsed but holds unusable values.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
