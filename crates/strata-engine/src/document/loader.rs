//! Bytes to [`Document`].

use std::path::PathBuf;

use thiserror::Error;

use super::{Document, DocumentKind, Format, Value};
use crate::violation::{Violation, ViolationKind};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Why a document could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("content is not valid UTF-8 (invalid byte at offset {offset})")]
    Encoding { offset: usize },

    #[error("{}", format_parse(*line, *column, message))]
    Parse {
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },
}

fn format_parse(line: Option<usize>, column: Option<usize>, message: &str) -> String {
    match (line, column) {
        (Some(l), Some(c)) => format!("syntax error at line {l}, column {c}: {message}"),
        (Some(l), None) => format!("syntax error at line {l}: {message}"),
        _ => format!("syntax error: {message}"),
    }
}

impl LoadError {
    /// The single violation recorded for a document that failed to load.
    pub fn to_violation(&self, source_path: impl AsRef<std::path::Path>) -> Violation {
        let kind = match self {
            Self::Encoding { .. } => ViolationKind::EncodingError,
            Self::Parse { .. } => ViolationKind::ParseError,
        };
        Violation::new(kind, source_path, "", self.to_string())
    }
}

/// Parse `bytes` as a document of `kind`.
///
/// Pure: the same input always yields an equal document. The base directory
/// defaults to the parent of `source_path`.
pub fn load(
    kind: DocumentKind,
    source_path: impl Into<PathBuf>,
    bytes: &[u8],
    format: Format,
) -> Result<Document, LoadError> {
    let source_path = source_path.into();
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes).map_err(|e| LoadError::Encoding {
        offset: e.valid_up_to(),
    })?;

    let raw = match format {
        Format::Yaml => parse_yaml(text)?,
        Format::Json => serde_json::from_str::<Value>(text).map_err(|e| LoadError::Parse {
            line: Some(e.line()),
            column: Some(e.column()),
            message: strip_location(&e.to_string()),
        })?,
    };

    let base_directory = source_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();

    Ok(Document {
        kind,
        source_path,
        base_directory,
        raw,
        format,
    })
}

fn parse_yaml(text: &str) -> Result<Value, LoadError> {
    // An empty or comment-only YAML stream is a null document.
    if text
        .lines()
        .all(|l| l.trim().is_empty() || l.trim_start().starts_with('#'))
    {
        return Ok(Value::Null);
    }
    serde_yaml::from_str::<Value>(text).map_err(|e| {
        let location = e.location();
        LoadError::Parse {
            line: location.as_ref().map(|l| l.line()),
            column: location.as_ref().map(|l| l.column()),
            message: strip_location(&e.to_string()),
        }
    })
}

/// Drop the trailing " at line X column Y" both parsers append; the location
/// is carried separately.
fn strip_location(message: &str) -> String {
    match message.find(" at line ") {
        Some(idx) => message[..idx].to_string(),
        None => message.to_string(),
    }
}
