//! The generic schema walk.

use indexmap::IndexMap;

use super::{schema_for, Constraint, FieldSpec, FieldType, IDENTIFIER, KEY_NAMING};
use crate::document::{Document, Value};
use crate::violation::{field_path, index_path, Severity, Violation, ViolationKind};

/// Checks documents against their kind's schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator {
    strict: bool,
}

impl SchemaValidator {
    /// In strict mode unknown fields are errors instead of warnings.
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Report every schema violation in `document`.
    ///
    /// Object fields are visited in declaration order followed by unknown
    /// keys in document order; array elements in index order. A value of the
    /// wrong type is reported once and its children are not visited. An
    /// explicit `null` counts as absent, as does an empty document.
    pub fn validate(&self, document: &Document) -> Vec<Violation> {
        let schema = schema_for(document.kind());
        let mut walk = Walk {
            document,
            strict: self.strict,
            violations: Vec::new(),
        };
        match document.raw() {
            Value::Object(map) => walk.object(&schema.fields, map, ""),
            Value::Null => walk.object(&schema.fields, &IndexMap::new(), ""),
            other => walk.report(
                ViolationKind::TypeMismatch,
                "",
                format!("document must be an object, found {}", other.type_name()),
            ),
        }
        walk.violations
    }
}

struct Walk<'a> {
    document: &'a Document,
    strict: bool,
    violations: Vec<Violation>,
}

impl Walk<'_> {
    fn report(&mut self, kind: ViolationKind, path: &str, message: String) {
        self.violations
            .push(Violation::new(kind, self.document.source_path(), path, message));
    }

    fn object(&mut self, fields: &[FieldSpec], map: &IndexMap<String, Value>, at: &str) {
        for spec in fields {
            let path = field_path(at, spec.name);
            match map.get(spec.name).filter(|v| !v.is_null()) {
                Some(value) => self.value(&spec.ty, &spec.constraints, value, &path),
                None if spec.required => self.report(
                    ViolationKind::MissingField,
                    &path,
                    format!("missing required field `{}`", spec.name),
                ),
                None => {}
            }
        }

        let severity = if self.strict {
            Severity::Error
        } else {
            Severity::Warning
        };
        for key in map.keys() {
            if !fields.iter().any(|f| f.name == key) {
                let violation = Violation::new(
                    ViolationKind::UnknownField,
                    self.document.source_path(),
                    field_path(at, key),
                    format!("unknown field `{key}`"),
                )
                .with_severity(severity);
                self.violations.push(violation);
            }
        }
    }

    fn value(&mut self, ty: &FieldType, constraints: &[Constraint], value: &Value, path: &str) {
        match (ty, value) {
            (FieldType::Any, _) | (FieldType::Boolean, Value::Bool(_)) => {}
            (FieldType::String, Value::String(_)) | (FieldType::Integer, Value::Integer(_)) => {
                self.constraints(constraints, value, path)
            }
            (FieldType::Path, Value::String(s)) => {
                if s.trim().is_empty() {
                    self.report(
                        ViolationKind::ConstraintViolation,
                        path,
                        "path must not be empty".to_string(),
                    );
                } else {
                    self.constraints(constraints, value, path);
                }
            }
            (FieldType::Array(element), Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    self.value(&element.ty, &element.constraints, item, &index_path(path, i));
                }
            }
            (FieldType::Object(fields), Value::Object(map)) => self.object(fields, map, path),
            (FieldType::Map(element), Value::Object(map)) => {
                for (key, item) in map {
                    let item_path = field_path(path, key);
                    if !KEY_NAMING.is_match(key) {
                        self.report(
                            ViolationKind::ConstraintViolation,
                            &item_path,
                            format!("key `{key}` must match {}", KEY_NAMING.as_str()),
                        );
                    }
                    self.value(&element.ty, &element.constraints, item, &item_path);
                }
            }
            (expected, found) => self.report(
                ViolationKind::TypeMismatch,
                path,
                format!("expected {}, found {}", expected.name(), found.type_name()),
            ),
        }
    }

    fn constraints(&mut self, constraints: &[Constraint], value: &Value, path: &str) {
        for constraint in constraints {
            if let Some(message) = check(constraint, value) {
                self.report(ViolationKind::ConstraintViolation, path, message);
            }
        }
    }
}

/// `None` if `value` satisfies `constraint`, else the failure message.
fn check(constraint: &Constraint, value: &Value) -> Option<String> {
    match (constraint, value) {
        (Constraint::NonEmpty, Value::String(s)) if s.trim().is_empty() => {
            Some("must not be empty".to_string())
        }
        (Constraint::Semver, Value::String(s)) => semver::Version::parse(s)
            .err()
            .map(|e| format!("`{s}` is not a semantic version: {e}")),
        (Constraint::KeyNaming, Value::String(s)) if !KEY_NAMING.is_match(s) => {
            Some(format!("`{s}` must match {}", KEY_NAMING.as_str()))
        }
        (Constraint::Identifier, Value::String(s)) if !IDENTIFIER.is_match(s) => {
            Some(format!("`{s}` must match {}", IDENTIFIER.as_str()))
        }
        (Constraint::OneOf(allowed), Value::String(s))
            if !allowed.iter().any(|a| *a == s.as_str()) =>
        {
            Some(format!("`{s}` must be one of: {}", allowed.join(", ")))
        }
        (Constraint::Min(min), Value::Integer(i)) if i < min => {
            Some(format!("must be at least {min}, found {i}"))
        }
        _ => None,
    }
}

/// A `Path`-typed value found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathField {
    pub field_path: String,
    pub value: String,
}

/// Every non-empty `Path`-typed string in `document`, in walk order.
///
/// Only well-typed parts of the document are visited, so a path under a
/// mismatched parent is never reported twice.
pub fn path_fields(document: &Document) -> Vec<PathField> {
    let mut out = Vec::new();
    if let Some(map) = document.raw().as_object() {
        collect_object(&schema_for(document.kind()).fields, map, "", &mut out);
    }
    out
}

fn collect_object(
    fields: &[FieldSpec],
    map: &IndexMap<String, Value>,
    at: &str,
    out: &mut Vec<PathField>,
) {
    for spec in fields {
        if let Some(value) = map.get(spec.name) {
            collect_value(&spec.ty, value, &field_path(at, spec.name), out);
        }
    }
}

fn collect_value(ty: &FieldType, value: &Value, path: &str, out: &mut Vec<PathField>) {
    match (ty, value) {
        (FieldType::Path, Value::String(s)) if !s.trim().is_empty() => out.push(PathField {
            field_path: path.to_string(),
            value: s.clone(),
        }),
        (FieldType::Array(element), Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                collect_value(&element.ty, item, &index_path(path, i), out);
            }
        }
        (FieldType::Object(fields), Value::Object(map)) => collect_object(fields, map, path, out),
        (FieldType::Map(element), Value::Object(map)) => {
            for (key, item) in map {
                collect_value(&element.ty, item, &field_path(path, key), out);
            }
        }
        _ => {}
    }
}
