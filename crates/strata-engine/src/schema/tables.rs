//! Field tables for each document kind.

use once_cell::sync::Lazy;

use super::{Constraint, ElementSpec, FieldSpec, FieldType, Schema};
use crate::document::DocumentKind;

const RULE_SEVERITIES: &[&str] = &["error", "warning", "info"];
const VARIABLE_TYPES: &[&str] = &["string", "integer", "boolean", "path"];
const REPORT_FORMATS: &[&str] = &["json", "yaml"];

static ROOT_STRUCTURE: Lazy<Schema> = Lazy::new(|| Schema {
    kind: DocumentKind::RootStructure,
    fields: vec![
        FieldSpec::required("version", FieldType::String).with(Constraint::Semver),
        FieldSpec::required("project-name", FieldType::String).with(Constraint::NonEmpty),
        FieldSpec::optional("description", FieldType::String),
        FieldSpec::optional(
            "key-directories",
            FieldType::array(FieldType::Object(vec![
                FieldSpec::required("path", FieldType::Path),
                FieldSpec::optional("purpose", FieldType::String),
            ])),
        ),
        FieldSpec::optional(
            "key_files",
            FieldType::array(FieldType::Object(vec![
                FieldSpec::required("path", FieldType::Path),
                FieldSpec::optional("description", FieldType::String),
            ])),
        ),
        FieldSpec::optional(
            "structure-config",
            FieldType::Object(vec![
                FieldSpec::optional("patterns", key_naming_list()),
                FieldSpec::optional("templates", key_naming_list()),
            ]),
        ),
        FieldSpec::optional(
            "rules",
            FieldType::Object(vec![
                FieldSpec::optional("required-directories", non_empty_list()),
                FieldSpec::optional("required-files", FieldType::array(FieldType::Path)),
                FieldSpec::optional("forbidden", non_empty_list()),
                FieldSpec::optional("max-depth", FieldType::Integer).with(Constraint::Min(1)),
            ]),
        ),
        FieldSpec::optional("conventions", FieldType::Any),
    ],
});

static PATTERN: Lazy<Schema> = Lazy::new(|| {
    let mut fields = definition_header();
    fields.extend([
        FieldSpec::optional("applies-to", FieldType::array(FieldType::String)),
        FieldSpec::optional("reference", FieldType::Path),
        FieldSpec::optional("required-files", FieldType::array(FieldType::Path)),
        FieldSpec::optional("rules", rule_list()),
        FieldSpec::optional("override", rule_list()),
        FieldSpec::optional("add", rule_list()),
    ]);
    Schema {
        kind: DocumentKind::Pattern,
        fields,
    }
});

static TEMPLATE: Lazy<Schema> = Lazy::new(|| {
    let mut fields = definition_header();
    fields.extend([
        FieldSpec::optional("variables", variable_list()),
        FieldSpec::optional("override", variable_list()),
        FieldSpec::optional("add", variable_list()),
        FieldSpec::optional(
            "structure",
            FieldType::array(FieldType::Object(vec![
                FieldSpec::required("path", FieldType::String).with(Constraint::NonEmpty),
                FieldSpec::optional("content", FieldType::String),
                FieldSpec::optional("source", FieldType::Path),
            ])),
        ),
    ]);
    Schema {
        kind: DocumentKind::Template,
        fields,
    }
});

static CONFIG: Lazy<Schema> = Lazy::new(|| Schema {
    kind: DocumentKind::Config,
    fields: vec![
        FieldSpec::optional("strict-mode", FieldType::Boolean),
        FieldSpec::optional("validate-paths", FieldType::Boolean),
        FieldSpec::optional("hooks-enabled", FieldType::Boolean),
        FieldSpec::optional("ignore", FieldType::array(FieldType::String)),
        FieldSpec::optional(
            "report",
            FieldType::Object(vec![
                FieldSpec::required("path", FieldType::String).with(Constraint::NonEmpty),
                FieldSpec::optional("format", FieldType::String)
                    .with(Constraint::OneOf(REPORT_FORMATS)),
            ]),
        ),
        FieldSpec::optional(
            "hooks",
            FieldType::map(FieldType::Object(vec![
                FieldSpec::optional("enabled", FieldType::Boolean),
                FieldSpec::optional("timeout", FieldType::Integer).with(Constraint::Min(1)),
                FieldSpec::optional("parallel", FieldType::Boolean),
                FieldSpec::optional("ignore-errors", FieldType::Boolean),
            ])),
        ),
    ],
});

/// The schema for a document kind.
pub fn schema_for(kind: DocumentKind) -> &'static Schema {
    match kind {
        DocumentKind::RootStructure => &ROOT_STRUCTURE,
        DocumentKind::Pattern => &PATTERN,
        DocumentKind::Template => &TEMPLATE,
        DocumentKind::Config => &CONFIG,
    }
}

/// Fields shared by patterns and templates.
fn definition_header() -> Vec<FieldSpec> {
    vec![
        FieldSpec::required("name", FieldType::String).with(Constraint::KeyNaming),
        FieldSpec::required("version", FieldType::String).with(Constraint::Semver),
        FieldSpec::optional("description", FieldType::String),
        FieldSpec::optional("extends", FieldType::String).with(Constraint::NonEmpty),
    ]
}

fn key_naming_list() -> FieldType {
    FieldType::array(ElementSpec::new(FieldType::String).with(Constraint::KeyNaming))
}

fn non_empty_list() -> FieldType {
    FieldType::array(ElementSpec::new(FieldType::String).with(Constraint::NonEmpty))
}

fn rule_list() -> FieldType {
    FieldType::array(FieldType::Object(vec![
        FieldSpec::required("name", FieldType::String).with(Constraint::NonEmpty),
        FieldSpec::optional("description", FieldType::String),
        FieldSpec::optional("severity", FieldType::String).with(Constraint::OneOf(RULE_SEVERITIES)),
        FieldSpec::optional("pattern", FieldType::String),
        FieldSpec::optional("required-files", FieldType::array(FieldType::Path)),
    ]))
}

fn variable_list() -> FieldType {
    FieldType::array(FieldType::Object(vec![
        FieldSpec::required("name", FieldType::String).with(Constraint::Identifier),
        FieldSpec::optional("type", FieldType::String).with(Constraint::OneOf(VARIABLE_TYPES)),
        FieldSpec::optional("required", FieldType::Boolean),
        FieldSpec::optional("default", FieldType::Any),
        FieldSpec::optional("description", FieldType::String),
    ]))
}
