use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading verifier configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown or unsupported config format for path: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to deserialize config from {format}: {message}")]
    Deserialization { format: String, message: String },

    #[error("Failed to serialize config to {format}: {message}")]
    Serialization { format: String, message: String },
}
