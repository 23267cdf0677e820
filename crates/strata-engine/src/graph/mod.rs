//! Pattern and template inheritance.
//!
//! A [`Definition`] is extracted from each loaded pattern or template
//! document and collected into a [`DefinitionSet`]. The [`GraphResolver`]
//! then flattens every `extends` chain into a [`MergedDefinition`].

mod resolver;
mod variables;

pub use resolver::{GraphResolver, MergedDefinition, Resolution};
pub use variables::placeholders;

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;

use crate::document::{Document, DocumentKind, Value};
use crate::violation::{field_path, index_path, Violation, ViolationKind};

/// Which namespace a definition lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pattern,
    Template,
}

impl Category {
    pub fn from_kind(kind: DocumentKind) -> Option<Self> {
        match kind {
            DocumentKind::Pattern => Some(Self::Pattern),
            DocumentKind::Template => Some(Self::Template),
            _ => None,
        }
    }

    /// The document field holding this category's entries.
    pub fn entries_field(self) -> &'static str {
        match self {
            Self::Pattern => "rules",
            Self::Template => "variables",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern => f.write_str("pattern"),
            Self::Template => f.write_str("template"),
        }
    }
}

/// Identity of a definition: its category and declared name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DefinitionKey {
    pub category: Category,
    pub name: String,
}

impl DefinitionKey {
    pub fn new(category: Category, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
        }
    }
}

impl fmt::Display for DefinitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.category, self.name)
    }
}

/// A named rule, variable or structure item, with where it was declared.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,
    pub value: Value,
    /// Document that declared the entry.
    pub source: PathBuf,
    /// Location of the entry inside `source`.
    pub field_path: String,
}

/// A pattern or template as written, before inheritance is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    key: DefinitionKey,
    /// File stem, which `extends` may use when it differs from the name.
    stem: String,
    source_path: PathBuf,
    extends: Option<String>,
    entries: Vec<Entry>,
    overrides: Vec<Entry>,
    additions: Vec<Entry>,
    structure: Vec<Entry>,
}

impl Definition {
    /// Extract a definition from a pattern or template document.
    ///
    /// Returns `None` for other kinds. The identity is the declared `name`,
    /// or the file stem when `name` is missing or not a string. Entries that
    /// are not objects with a string `name` are skipped; the schema validator
    /// reports those.
    pub fn from_document(document: &Document) -> Option<Self> {
        let category = Category::from_kind(document.kind())?;
        let raw = document.raw();
        let source = document.source_path();

        let extends = raw
            .get("extends")
            .and_then(Value::as_str)
            .map(definition_name)
            .filter(|name| !name.is_empty());

        let name = raw
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| document.stem());

        Some(Self {
            key: DefinitionKey::new(category, name),
            stem: document.stem().to_string(),
            source_path: source.to_path_buf(),
            extends,
            entries: named_entries(raw, category.entries_field(), "name", source),
            overrides: named_entries(raw, "override", "name", source),
            additions: named_entries(raw, "add", "name", source),
            structure: if category == Category::Template {
                named_entries(raw, "structure", "path", source)
            } else {
                Vec::new()
            },
        })
    }

    pub fn key(&self) -> &DefinitionKey {
        &self.key
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Name of the parent, extension stripped.
    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }
}

/// `extends` references may name the file with or without its extension.
fn definition_name(reference: &str) -> String {
    let reference = reference.trim();
    for ext in [".yaml", ".yml", ".json"] {
        if let Some(stem) = reference.strip_suffix(ext) {
            return stem.to_string();
        }
    }
    reference.to_string()
}

fn named_entries(raw: &Value, field: &str, name_key: &str, source: &Path) -> Vec<Entry> {
    let Some(items) = raw.get(field).and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let name = item.get(name_key)?.as_str()?;
            Some(Entry {
                name: name.to_string(),
                value: item.clone(),
                source: source.to_path_buf(),
                field_path: index_path(field, i),
            })
        })
        .collect()
}

/// All definitions of a run, unique per key, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct DefinitionSet {
    definitions: IndexMap<DefinitionKey, Definition>,
}

impl DefinitionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition. A second definition with the same key is rejected.
    pub fn insert(&mut self, definition: Definition) -> Result<(), Violation> {
        if let Some(existing) = self.definitions.get(&definition.key) {
            return Err(Violation::new(
                ViolationKind::DuplicateDefinition,
                &definition.source_path,
                field_path("", "name"),
                format!(
                    "{} is already defined by {}",
                    definition.key,
                    existing.source_path.display()
                ),
            ));
        }
        self.definitions.insert(definition.key.clone(), definition);
        Ok(())
    }

    pub fn get(&self, key: &DefinitionKey) -> Option<&Definition> {
        self.definitions.get(key)
    }

    /// Find the definition a reference points at: by declared name first,
    /// then by file stem. A file extension on the reference is ignored.
    pub fn lookup(&self, category: Category, reference: &str) -> Option<&Definition> {
        let name = definition_name(reference);
        self.definitions
            .get(&DefinitionKey::new(category, name.as_str()))
            .or_else(|| {
                self.definitions
                    .values()
                    .find(|d| d.key.category == category && d.stem == name)
            })
    }

    pub fn contains(&self, category: Category, reference: &str) -> bool {
        self.lookup(category, reference).is_some()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.values()
    }
}
