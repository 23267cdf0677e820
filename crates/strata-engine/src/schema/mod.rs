//! Static document schemas and the validator that checks documents against
//! them.
//!
//! Each [`DocumentKind`] has exactly one [`Schema`], built once on first use
//! and never mutated. The validator is one generic walk over the
//! [`FieldSpec`] tables.

mod tables;
mod validator;

pub use tables::schema_for;
pub use validator::{path_fields, PathField, SchemaValidator};

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::document::DocumentKind;

/// `^[a-z][a-z0-9-]*$`: names of patterns, templates, hooks.
pub static KEY_NAMING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9-]*$").expect("valid key-naming regex"));

/// `^[A-Za-z_][A-Za-z0-9_]*$`: template variable names.
pub static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// The declared shape of a value.
#[derive(Debug, Clone)]
pub enum FieldType {
    String,
    Integer,
    Boolean,
    /// A string naming a file or directory, resolved by the path resolver.
    Path,
    /// Anything, including null. Children are not inspected.
    Any,
    Array(Box<ElementSpec>),
    /// Declared children; other keys are unknown fields.
    Object(Vec<FieldSpec>),
    /// Free keys (key-naming) mapping to values of one shape.
    Map(Box<ElementSpec>),
}

impl FieldType {
    pub fn array(element: impl Into<ElementSpec>) -> Self {
        Self::Array(Box::new(element.into()))
    }

    pub fn map(element: impl Into<ElementSpec>) -> Self {
        Self::Map(Box::new(element.into()))
    }

    /// Short name used in type-mismatch messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Path => "path",
            Self::Any => "any",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Map(_) => "map",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array(element) => write!(f, "array<{}>", element.ty),
            Self::Map(element) => write!(f, "map<{}>", element.ty),
            other => f.write_str(other.name()),
        }
    }
}

/// A check applied to a value that already has the right type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Strings: not empty after trimming.
    NonEmpty,
    /// Strings: a semantic version (`1.2.3`).
    Semver,
    /// Strings: matches [`KEY_NAMING`].
    KeyNaming,
    /// Strings: matches [`IDENTIFIER`].
    Identifier,
    /// Strings: one of a fixed set.
    OneOf(&'static [&'static str]),
    /// Integers: at least this value.
    Min(i64),
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonEmpty => f.write_str("non-empty"),
            Self::Semver => f.write_str("semver"),
            Self::KeyNaming => f.write_str("key-naming"),
            Self::Identifier => f.write_str("identifier"),
            Self::OneOf(values) => write!(f, "one of {}", values.join("|")),
            Self::Min(min) => write!(f, ">= {min}"),
        }
    }
}

/// Shape of an array element or map value.
#[derive(Debug, Clone)]
pub struct ElementSpec {
    pub ty: FieldType,
    pub constraints: Vec<Constraint>,
}

impl ElementSpec {
    pub fn new(ty: FieldType) -> Self {
        Self {
            ty,
            constraints: Vec::new(),
        }
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

impl From<FieldType> for ElementSpec {
    fn from(ty: FieldType) -> Self {
        Self::new(ty)
    }
}

/// One declared field of an object.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
    pub constraints: Vec<Constraint>,
}

impl FieldSpec {
    pub fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: true,
            constraints: Vec::new(),
        }
    }

    pub fn optional(name: &'static str, ty: FieldType) -> Self {
        Self {
            required: false,
            ..Self::required(name, ty)
        }
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// The schema of one document kind.
#[derive(Debug, Clone)]
pub struct Schema {
    pub kind: DocumentKind,
    pub fields: Vec<FieldSpec>,
}

/// A flattened schema line, for listing a schema to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRow {
    /// Field path with `[]` for array elements and `<key>` for map values.
    pub path: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub required: bool,
    pub constraints: Vec<String>,
}

impl Schema {
    /// Every field, depth-first in declaration order.
    pub fn rows(&self) -> Vec<FieldRow> {
        let mut rows = Vec::new();
        collect_rows(&self.fields, "", &mut rows);
        rows
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

fn collect_rows(fields: &[FieldSpec], parent: &str, rows: &mut Vec<FieldRow>) {
    for field in fields {
        let path = crate::violation::field_path(parent, field.name);
        rows.push(FieldRow {
            path: path.clone(),
            ty: field.ty.to_string(),
            required: field.required,
            constraints: field.constraints.iter().map(ToString::to_string).collect(),
        });
        collect_nested(&field.ty, &path, rows);
    }
}

fn collect_nested(ty: &FieldType, path: &str, rows: &mut Vec<FieldRow>) {
    match ty {
        FieldType::Object(children) => collect_rows(children, path, rows),
        FieldType::Array(element) | FieldType::Map(element) => {
            let marker = if matches!(ty, FieldType::Array(_)) {
                format!("{path}[]")
            } else {
                format!("{path}.<key>")
            };
            if !element.constraints.is_empty() {
                rows.push(FieldRow {
                    path: marker.clone(),
                    ty: element.ty.to_string(),
                    required: false,
                    constraints: element.constraints.iter().map(ToString::to_string).collect(),
                });
            }
            collect_nested(&element.ty, &marker, rows);
        }
        _ => {}
    }
}
