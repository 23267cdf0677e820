//! Reported problems.
//!
//! Every component returns its findings as a list of [`Violation`]s. Nothing
//! in the engine raises an error for a problem in the validated project; only
//! the orchestrator decides whether a finding aborts the run.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Category of a reported problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViolationKind {
    ParseError,
    EncodingError,
    MissingField,
    TypeMismatch,
    ConstraintViolation,
    UnknownField,
    ForbiddenPath,
    PathNotFound,
    MissingDirectory,
    CircularDependency,
    DanglingOverride,
    DuplicateRuleName,
    DuplicateDefinition,
    UndefinedVariable,
    DanglingReference,
    DanglingHookReference,
    NotExecutable,
    HookTimeout,
    NoStructureFile,
}

impl ViolationKind {
    /// Severity before strict-mode and `ignore-errors` adjustments.
    pub fn default_severity(self) -> Severity {
        match self {
            Self::UnknownField => Severity::Warning,
            Self::NoStructureFile => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParseError => "ParseError",
            Self::EncodingError => "EncodingError",
            Self::MissingField => "MissingField",
            Self::TypeMismatch => "TypeMismatch",
            Self::ConstraintViolation => "ConstraintViolation",
            Self::UnknownField => "UnknownField",
            Self::ForbiddenPath => "ForbiddenPath",
            Self::PathNotFound => "PathNotFound",
            Self::MissingDirectory => "MissingDirectory",
            Self::CircularDependency => "CircularDependency",
            Self::DanglingOverride => "DanglingOverride",
            Self::DuplicateRuleName => "DuplicateRuleName",
            Self::DuplicateDefinition => "DuplicateDefinition",
            Self::UndefinedVariable => "UndefinedVariable",
            Self::DanglingReference => "DanglingReference",
            Self::DanglingHookReference => "DanglingHookReference",
            Self::NotExecutable => "NotExecutable",
            Self::HookTimeout => "HookTimeout",
            Self::NoStructureFile => "NoStructureFile",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much a violation matters for the pass/fail decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
            Self::Fatal => f.write_str("fatal"),
        }
    }
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Document (or script) the problem was found in.
    pub document_path: PathBuf,
    /// Dotted/indexed locator inside the document; empty for the whole document.
    pub field_path: String,
    pub kind: ViolationKind,
    pub message: String,
    pub severity: Severity,
}

impl Violation {
    /// Create a violation with the kind's default severity.
    pub fn new(
        kind: ViolationKind,
        document_path: impl AsRef<Path>,
        field_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            document_path: document_path.as_ref().to_path_buf(),
            field_path: field_path.into(),
            kind,
            message: message.into(),
            severity: kind.default_severity(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// True for Error and Fatal severities.
    pub fn is_error(&self) -> bool {
        self.severity >= Severity::Error
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.document_path.display())?;
        if !self.field_path.is_empty() {
            write!(f, " [{}]", self.field_path)?;
        }
        write!(f, ": {} ({})", self.message, self.kind)
    }
}

/// `parent.name`, or `name` at the document root.
pub(crate) fn field_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

/// `parent[index]`.
pub(crate) fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}
