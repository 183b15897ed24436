//! Error types for curtain-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading `commands.json`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be opened or read.
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON, or JSON that does not match the config shape.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Well-formed JSON that breaks a config invariant.
    #[error("invalid config at {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}
