//! CLI error handling.

use std::io;
use std::path::PathBuf;

use strata_common_core::ErrorCategory;
use thiserror::Error;

use crate::Exit;

/// Errors that stop a command before it can report a result.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
        path: Option<PathBuf>,
    },

    #[error(transparent)]
    Engine(#[from] strata_common_core::Error),

    #[error("{message}")]
    Usage {
        message: String,
        hint: Option<String>,
    },

    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Exit code for this error
    pub fn exit(&self) -> Exit {
        match self {
            Self::Io { .. } => Exit::IoError,
            Self::Engine(e) if e.category() == ErrorCategory::FileSystem => Exit::IoError,
            Self::Engine(_) | Self::Usage { .. } | Self::Other(_) => Exit::Failed,
        }
    }

    /// Get hint for this error if available
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Usage { hint, .. } => hint.as_deref(),
            Self::Io { path: Some(_), .. } => Some("check that the path exists and is readable"),
            _ => None,
        }
    }

    /// Create an IO error with path
    pub fn io_with_path(
        message: impl Into<String>,
        source: io::Error,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self::Io {
            message: message.into(),
            source,
            path: Some(path.into()),
        }
    }

    pub fn usage_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }
}
