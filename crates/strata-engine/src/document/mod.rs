//! Parsed configuration documents.

mod loader;
mod value;

pub use loader::{load, LoadError};
pub use value::Value;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// What a document describes. Each kind has exactly one schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    RootStructure,
    Pattern,
    Template,
    Config,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::RootStructure,
        DocumentKind::Pattern,
        DocumentKind::Template,
        DocumentKind::Config,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RootStructure => "root-structure",
            Self::Pattern => "pattern",
            Self::Template => "template",
            Self::Config => "config",
        }
    }

    /// Parse the kebab-case name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialization format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Infer the format from the file extension: `.yaml`/`.yml` or `.json`.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// A loaded configuration unit. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    kind: DocumentKind,
    source_path: PathBuf,
    base_directory: PathBuf,
    raw: Value,
    format: Format,
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Directory that relative paths in this document are resolved against.
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Replace the base directory (defaults to the source's parent).
    pub fn with_base_directory(mut self, base: impl Into<PathBuf>) -> Self {
        self.base_directory = base.into();
        self
    }

    /// File stem of the source, used as a definition's identity.
    pub fn stem(&self) -> &str {
        self.source_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }
}
