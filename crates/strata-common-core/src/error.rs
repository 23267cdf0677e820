//! Error types shared by the Strata support crates.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// The main error type for Strata infrastructure operations.
///
/// Validation findings are never reported through this type; they are data
/// (`Violation`s) owned by the engine. This error covers the ambient layer:
/// reading files, decoding configuration, writing reports.
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error with custom message.
    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A filesystem operation failed.
    #[error("{message}: {}", path.display())]
    FileSystem {
        message: String,
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// A path does not exist.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Coarse grouping of errors, used by callers choosing exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Internal,
    FileSystem,
    Config,
    Serialization,
}

impl Error {
    /// Create a new generic error.
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap an I/O error that happened while touching `path`.
    pub fn io(message: impl Into<String>, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound(path);
        }
        Self::FileSystem {
            message: message.into(),
            path,
            source: Some(source),
        }
    }

    /// Category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Internal { .. } => ErrorCategory::Internal,
            Self::FileSystem { .. } | Self::NotFound(_) => ErrorCategory::FileSystem,
            Self::Config(_) => ErrorCategory::Config,
            Self::Serialization(_) => ErrorCategory::Serialization,
        }
    }

    /// True if this error means the target path does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type alias using Strata's Error.
pub type Result<T> = std::result::Result<T, Error>;
