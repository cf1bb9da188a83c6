//! Error types surfaced by the logger service.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to persist a blob through `Logger::log_file`.
#[derive(Debug, Error)]
pub enum FileWriteError {
    #[error("invalid log file name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileWriteError {
    /// Path the failed write was aimed at, when one had been resolved.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::InvalidName { .. } => None,
            Self::CreateDir { path, .. } | Self::Write { path, .. } => Some(path),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
