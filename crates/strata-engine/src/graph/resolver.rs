//! Three-colour DFS over the `extends` graph with per-node memoisation.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use super::variables::undefined_variables;
use super::{Category, Definition, DefinitionKey, DefinitionSet, Entry};
use crate::violation::{Violation, ViolationKind};

/// A definition with its whole `extends` chain applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedDefinition {
    pub key: DefinitionKey,
    pub source_path: PathBuf,
    /// Ancestors, nearest first.
    pub ancestors: Vec<String>,
    /// Merged rules (patterns) or variables (templates).
    pub entries: Vec<Entry>,
    /// Merged structure items; always empty for patterns.
    pub structure: Vec<Entry>,
}

impl MergedDefinition {
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entry_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }
}

/// Result of resolving a [`DefinitionSet`].
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Successfully merged definitions, in set order.
    pub merged: IndexMap<DefinitionKey, MergedDefinition>,
    pub violations: Vec<Violation>,
    /// Number of merges computed; each node is merged at most once.
    pub merges_performed: usize,
}

impl Resolution {
    pub fn get(&self, category: Category, name: &str) -> Option<&MergedDefinition> {
        self.merged.get(&DefinitionKey::new(category, name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Colour {
    Unvisited,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy)]
enum Parent {
    None,
    Node(usize),
    Missing,
}

/// Flattens `extends` chains.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphResolver;

impl GraphResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, set: &DefinitionSet) -> Resolution {
        let nodes: Vec<&Definition> = set.iter().collect();
        let index: IndexMap<&DefinitionKey, usize> =
            nodes.iter().enumerate().map(|(i, d)| (d.key(), i)).collect();

        let parents = nodes
            .iter()
            .map(|def| match def.extends() {
                None => Parent::None,
                Some(reference) => set
                    .lookup(def.key().category, reference)
                    .and_then(|parent| index.get(parent.key()))
                    .map_or(Parent::Missing, |&i| Parent::Node(i)),
            })
            .collect();

        let mut walk = Walk {
            nodes: &nodes,
            parents,
            colour: vec![Colour::Unvisited; nodes.len()],
            merged: vec![None; nodes.len()],
            stack: Vec::new(),
            violations: Vec::new(),
            merges_performed: 0,
        };
        for i in 0..nodes.len() {
            walk.visit(i);
        }

        let mut resolution = Resolution {
            violations: walk.violations,
            merges_performed: walk.merges_performed,
            ..Resolution::default()
        };
        for (i, merged) in walk.merged.into_iter().enumerate() {
            match merged {
                Some(m) => {
                    resolution.merged.insert(m.key.clone(), m);
                }
                None => debug!(definition = %nodes[i].key(), "left unmerged"),
            }
        }
        resolution
    }
}

struct Walk<'a> {
    nodes: &'a [&'a Definition],
    parents: Vec<Parent>,
    colour: Vec<Colour>,
    merged: Vec<Option<MergedDefinition>>,
    stack: Vec<usize>,
    violations: Vec<Violation>,
    merges_performed: usize,
}

impl Walk<'_> {
    fn visit(&mut self, i: usize) {
        if self.colour[i] != Colour::Unvisited {
            return;
        }
        self.colour[i] = Colour::InProgress;
        self.stack.push(i);

        let def = self.nodes[i];
        let merged = match self.parents[i] {
            Parent::None => Some(self.merge_root(def)),
            Parent::Missing => {
                self.violations.push(Violation::new(
                    ViolationKind::DanglingReference,
                    def.source_path(),
                    "extends",
                    format!(
                        "extends `{}` but no {} with that name exists",
                        def.extends().unwrap_or_default(),
                        def.key().category
                    ),
                ));
                None
            }
            Parent::Node(p) => {
                if self.colour[p] == Colour::InProgress {
                    self.report_cycle(i, p);
                    None
                } else {
                    self.visit(p);
                    match self.merged[p].clone() {
                        Some(parent) => Some(self.merge_child(&parent, def)),
                        None => None,
                    }
                }
            }
        };

        if let Some(merged) = &merged {
            self.merges_performed += 1;
            if merged.key.category == Category::Template {
                self.violations.extend(undefined_variables(merged));
            }
        }
        self.merged[i] = merged;
        self.stack.pop();
        self.colour[i] = Colour::Done;
    }

    /// `closing` extends `target`, which is still on the stack.
    fn report_cycle(&mut self, closing: usize, target: usize) {
        let start = self
            .stack
            .iter()
            .position(|&n| n == target)
            .unwrap_or_default();
        let mut names: Vec<&str> = self.stack[start..]
            .iter()
            .map(|&n| self.nodes[n].key().name.as_str())
            .collect();
        names.push(self.nodes[target].key().name.as_str());

        let def = self.nodes[closing];
        self.violations.push(Violation::new(
            ViolationKind::CircularDependency,
            def.source_path(),
            "extends",
            format!("circular {} inheritance: {}", def.key().category, names.join(" -> ")),
        ));
    }

    fn merge_root(&mut self, def: &Definition) -> MergedDefinition {
        let mut entries = Vec::new();
        for entry in def.entries.iter().chain(&def.additions) {
            self.append(&mut entries, entry);
        }
        for entry in &def.overrides {
            self.violations.push(Violation::new(
                ViolationKind::DanglingOverride,
                &entry.source,
                &entry.field_path,
                format!(
                    "override `{}` has nothing to replace: {} does not extend anything",
                    entry.name,
                    def.key()
                ),
            ));
        }

        MergedDefinition {
            key: def.key().clone(),
            source_path: def.source_path().to_path_buf(),
            ancestors: Vec::new(),
            entries,
            structure: merge_structure(Vec::new(), &def.structure),
        }
    }

    fn merge_child(&mut self, parent: &MergedDefinition, def: &Definition) -> MergedDefinition {
        let mut entries = parent.entries.clone();

        for entry in &def.overrides {
            match entries.iter_mut().find(|e| e.name == entry.name) {
                Some(slot) => *slot = entry.clone(),
                None => self.violations.push(Violation::new(
                    ViolationKind::DanglingOverride,
                    &entry.source,
                    &entry.field_path,
                    format!(
                        "override `{}` does not match any entry inherited from {}",
                        entry.name, parent.key
                    ),
                )),
            }
        }
        for entry in def.entries.iter().chain(&def.additions) {
            self.append(&mut entries, entry);
        }

        let mut ancestors = vec![parent.key.name.clone()];
        ancestors.extend(parent.ancestors.iter().cloned());

        MergedDefinition {
            key: def.key().clone(),
            source_path: def.source_path().to_path_buf(),
            ancestors,
            entries,
            structure: merge_structure(parent.structure.clone(), &def.structure),
        }
    }

    fn append(&mut self, entries: &mut Vec<Entry>, entry: &Entry) {
        if let Some(existing) = entries.iter().find(|e| e.name == entry.name) {
            self.violations.push(Violation::new(
                ViolationKind::DuplicateRuleName,
                &entry.source,
                &entry.field_path,
                format!(
                    "`{}` is already defined at {} [{}]",
                    entry.name,
                    existing.source.display(),
                    existing.field_path
                ),
            ));
        } else {
            entries.push(entry.clone());
        }
    }
}

/// Structure items are keyed by path: a later item replaces an earlier one.
fn merge_structure(mut merged: Vec<Entry>, items: &[Entry]) -> Vec<Entry> {
    for item in items {
        match merged.iter_mut().find(|e| e.name == item.name) {
            Some(slot) => *slot = item.clone(),
            None => merged.push(item.clone()),
        }
    }
    merged
}
