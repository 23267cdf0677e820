//! Drives one validation run.
//!
//! The run moves through a fixed sequence of states and ends in one of three
//! outcomes:
//!
//! ```text
//! Start -> DiscoverRoot -> LoadRoot -> LoadStructureTree -> ValidateAll -> Report
//!                 \-> Aborted (no structure file)         Passed | Failed <-/
//! ```
//!
//! Components only return violations; this is the one place that decides
//! whether the run stops.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use strata_common_config::{
    parse as parse_config, ConfigFormat, ReportConfig, Settings, StructureConfig, ValidateOptions,
    CONFIG_FILE_NAMES,
};
use strata_common_fs::path::{normalize, resolve_within};
use strata_common_fs::FileSystem;
use strata_common_log::spans::{document_span, instrument_future, run_span, stage_span, Timer};
use tracing::{debug, info, warn};

use crate::document::{load, Document, DocumentKind, Format};
use crate::graph::{Category, Definition, DefinitionSet, GraphResolver};
use crate::hooks::HookRegistry;
use crate::paths::PathResolver;
use crate::report::ValidationReport;
use crate::schema::SchemaValidator;
use crate::violation::{index_path, Violation, ViolationKind};

/// Root structure file names, in lookup order.
pub const ROOT_FILE_NAMES: [&str; 3] = ["structure.yaml", "structure.yml", "structure.json"];

/// Name of the project's metadata directory.
pub const STRUCTURE_DIR: &str = ".structure";

const PATTERNS_DIR: &str = "patterns";
const TEMPLATES_DIR: &str = "templates";
const HOOKS_DIR: &str = "hooks";

/// Where a run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Start,
    DiscoverRoot,
    LoadRoot,
    LoadStructureTree,
    ValidateAll,
    Report,
    Passed,
    Failed,
    Aborted,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Aborted)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::DiscoverRoot => "discover-root",
            Self::LoadRoot => "load-root",
            Self::LoadStructureTree => "load-structure-tree",
            Self::ValidateAll => "validate-all",
            Self::Report => "report",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// A document found on disk but not yet loaded.
#[derive(Debug, Clone)]
struct Candidate {
    kind: DocumentKind,
    path: PathBuf,
}

/// One validation run over a project.
pub struct Orchestrator<'a> {
    project_root: PathBuf,
    options: ValidateOptions,
    fs: &'a dyn FileSystem,
    state: RunState,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        project_root: impl Into<PathBuf>,
        options: ValidateOptions,
        fs: &'a dyn FileSystem,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            options,
            fs,
            state: RunState::Start,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = %self.state, to = %next, "run state");
        self.state = next;
    }

    fn structure_dir(&self) -> PathBuf {
        self.project_root.join(STRUCTURE_DIR)
    }

    /// Run to completion.
    pub async fn run(mut self) -> ValidationReport {
        let span = run_span(&self.project_root);
        instrument_future(async move { self.execute().await }, span).await
    }

    async fn execute(&mut self) -> ValidationReport {
        let timer = Timer::start("validate");
        info!(root = %self.project_root.display(), "validation started");

        self.transition(RunState::DiscoverRoot);
        let root_file = self.first_file(&self.project_root, &ROOT_FILE_NAMES).await;
        let main_file = self.first_file(&self.structure_dir(), &ROOT_FILE_NAMES).await;
        if root_file.is_none() && main_file.is_none() {
            self.transition(RunState::Aborted);
            let reason = Violation::new(
                ViolationKind::NoStructureFile,
                &self.project_root,
                "",
                format!(
                    "no structure file found: expected one of {} at the project root or in {STRUCTURE_DIR}/",
                    ROOT_FILE_NAMES.join(", ")
                ),
            );
            warn!("{}", reason.message);
            timer.finish();
            let settings = self.options.settings(&StructureConfig::default());
            return ValidationReport::aborted(&self.project_root, settings, reason);
        }

        let mut violations = Vec::new();
        let mut documents = Vec::new();
        // Discovery order of every document path, for ordering the report.
        let mut ranks: HashMap<PathBuf, usize> = HashMap::new();

        self.transition(RunState::LoadRoot);
        if let Some(path) = root_file {
            let candidate = Candidate {
                kind: DocumentKind::RootStructure,
                path,
            };
            ranks.insert(candidate.path.clone(), ranks.len());
            match self.load_candidate(&candidate).await {
                Ok(doc) => documents.push(doc),
                Err(v) => violations.push(v),
            }
        }

        self.transition(RunState::LoadStructureTree);
        let candidates = self.discover_tree(main_file).await;
        for candidate in &candidates {
            ranks.insert(candidate.path.clone(), ranks.len());
        }
        let loaded = instrument_future(
            join_all(candidates.iter().map(|c| self.load_candidate(c))),
            stage_span("load"),
        )
        .await;
        for result in loaded {
            match result {
                Ok(doc) => documents.push(doc),
                Err(v) => violations.push(v),
            }
        }

        let config_doc = documents.iter().find(|d| d.kind() == DocumentKind::Config);
        let config = config_doc.map(typed_config).unwrap_or_default();
        let config_path = config_doc
            .map(|d| d.source_path().to_path_buf())
            .unwrap_or_else(|| self.structure_dir().join(CONFIG_FILE_NAMES[0]));
        let settings = self.options.settings(&config);
        debug!(?settings, documents = documents.len(), "settings resolved");

        self.transition(RunState::ValidateAll);
        let checked = instrument_future(
            self.check_documents(&documents, &config, settings),
            stage_span("documents"),
        )
        .await;
        violations.extend(checked);

        let mut definitions = DefinitionSet::new();
        for definition in documents.iter().filter_map(Definition::from_document) {
            if let Err(v) = definitions.insert(definition) {
                violations.push(v);
            }
        }
        let resolution =
            stage_span("graph").in_scope(|| GraphResolver::new().resolve(&definitions));
        debug!(
            merged = resolution.merged.len(),
            merges = resolution.merges_performed,
            "definitions resolved"
        );
        violations.extend(resolution.violations);

        for doc in documents.iter().filter(|d| d.kind() == DocumentKind::RootStructure) {
            violations.extend(cross_references(doc, &definitions));
        }

        let hooks = if settings.hooks_enabled {
            let (registry, found) = self.build_hooks(&config, &config_path).await;
            violations.extend(found);
            registry
        } else {
            debug!("hooks disabled");
            HookRegistry::default()
        };

        let report_target = config
            .report
            .as_ref()
            .and_then(|report| match self.report_target(report, &config_path, &ranks) {
                Ok(path) => Some((path, report.format)),
                Err(v) => {
                    violations.push(v);
                    None
                }
            });

        self.transition(RunState::Report);
        // Unranked paths are hook scripts; they sort after every document.
        violations.sort_by_key(|v| ranks.get(&v.document_path).copied().unwrap_or(usize::MAX));

        let report = ValidationReport::completed(
            &self.project_root,
            settings,
            violations,
            resolution.merged,
            hooks,
        );
        self.transition(if report.passed {
            RunState::Passed
        } else {
            RunState::Failed
        });

        if let Some((path, format)) = report_target {
            match report.write_to(&path, format).await {
                Ok(()) => info!(path = %path.display(), "report written"),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to write report"),
            }
        }

        let elapsed = timer.finish();
        info!(
            outcome = %report.outcome,
            errors = report.errors().count(),
            warnings = report.warnings().count(),
            elapsed_ms = elapsed.as_millis() as u64,
            "validation finished"
        );
        report
    }

    /// First of `names` that exists as a file in `dir`.
    async fn first_file(&self, dir: &Path, names: &[&str]) -> Option<PathBuf> {
        for name in names {
            let path = dir.join(name);
            if self.fs.exists(&path).await && !self.fs.is_dir(&path).await {
                return Some(path);
            }
        }
        None
    }

    /// Documents under `.structure/`, in discovery order.
    async fn discover_tree(&self, main_file: Option<PathBuf>) -> Vec<Candidate> {
        let dir = self.structure_dir();
        let mut candidates = Vec::new();

        if let Some(path) = main_file {
            candidates.push(Candidate {
                kind: DocumentKind::RootStructure,
                path,
            });
        }
        if let Some(path) = self.first_file(&dir, &CONFIG_FILE_NAMES).await {
            candidates.push(Candidate {
                kind: DocumentKind::Config,
                path,
            });
        }
        for (sub, kind) in [
            (PATTERNS_DIR, DocumentKind::Pattern),
            (TEMPLATES_DIR, DocumentKind::Template),
        ] {
            let sub_dir = dir.join(sub);
            if !self.fs.is_dir(&sub_dir).await {
                continue;
            }
            match self.fs.list_directory(&sub_dir).await {
                Ok(entries) => candidates.extend(
                    entries
                        .into_iter()
                        .filter(|e| !e.is_dir() && Format::from_path(&e.name).is_some())
                        .map(|e| Candidate { kind, path: e.path }),
                ),
                Err(e) => warn!(dir = %sub_dir.display(), error = %e, "failed to list directory"),
            }
        }
        candidates
    }

    /// Read and parse one candidate. Failures become its single violation.
    async fn load_candidate(&self, candidate: &Candidate) -> Result<Document, Violation> {
        let path = &candidate.path;
        let span = document_span(candidate.kind.as_str(), path);
        instrument_future(
            async move {
                let bytes = self.fs.read_file(path).await.map_err(|e| {
                    warn!(error = %e, "excluding unreadable document");
                    Violation::new(
                        ViolationKind::ParseError,
                        path,
                        "",
                        format!("failed to read document: {e}"),
                    )
                })?;
                let format = Format::from_path(path).ok_or_else(|| {
                    Violation::new(
                        ViolationKind::ParseError,
                        path,
                        "",
                        "unsupported document extension",
                    )
                })?;
                match load(candidate.kind, path.clone(), &bytes, format) {
                    Ok(doc) => {
                        debug!("document loaded");
                        Ok(doc.with_base_directory(&self.project_root))
                    }
                    Err(e) => {
                        warn!(error = %e, "excluding malformed document");
                        Err(e.to_violation(path))
                    }
                }
            },
            span,
        )
        .await
    }

    async fn check_documents(
        &self,
        documents: &[Document],
        config: &StructureConfig,
        settings: Settings,
    ) -> Vec<Violation> {
        let validator = SchemaValidator::new(settings.strict_mode);
        let resolver =
            PathResolver::new(&self.project_root, settings.validate_paths, &config.ignore);
        let checks = documents.iter().map(|doc| {
            let resolver = &resolver;
            async move {
                let mut found = validator.validate(doc);
                found.extend(resolver.check(doc, self.fs).await);
                found
            }
        });
        join_all(checks).await.into_iter().flatten().collect()
    }

    async fn build_hooks(
        &self,
        config: &StructureConfig,
        config_path: &Path,
    ) -> (HookRegistry, Vec<Violation>) {
        let hooks_dir = self.structure_dir().join(HOOKS_DIR);
        let entries = if self.fs.is_dir(&hooks_dir).await {
            match self.fs.list_directory(&hooks_dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(dir = %hooks_dir.display(), error = %e, "failed to list hooks");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        let (registry, violations) =
            HookRegistry::build(&hooks_dir, &entries, &config.hooks, config_path);
        debug!(hooks = registry.len(), "hook registry built");
        (registry, violations)
    }

    /// Resolve the configured report file. It must stay inside the project
    /// and must not be one of the discovered documents.
    fn report_target(
        &self,
        report: &ReportConfig,
        config_path: &Path,
        documents: &HashMap<PathBuf, usize>,
    ) -> Result<PathBuf, Violation> {
        let forbidden = |message: String| {
            Violation::new(ViolationKind::ForbiddenPath, config_path, "report.path", message)
        };
        let target =
            resolve_within(&self.project_root, &report.path, &self.project_root).map_err(|resolved| {
                forbidden(format!(
                    "report path `{}` resolves to {} outside the project root",
                    report.path.display(),
                    resolved.display()
                ))
            })?;
        if documents.keys().any(|doc| normalize(doc) == target) {
            return Err(forbidden(format!(
                "report path `{}` would overwrite a structure document",
                report.path.display()
            )));
        }
        Ok(target)
    }
}

/// Typed view of the config document. Shape errors are reported by the
/// schema validator, so a document that does not fit falls back to defaults.
fn typed_config(doc: &Document) -> StructureConfig {
    let parsed = serde_json::to_string(doc.raw())
        .map_err(|e| e.to_string())
        .and_then(|json| parse_config(&json, ConfigFormat::Json).map_err(|e| e.to_string()));
    match parsed {
        Ok(config) => config,
        Err(e) => {
            debug!(error = %e, "config does not match its typed view, using defaults");
            StructureConfig::default()
        }
    }
}

/// `structure-config.patterns` / `.templates` entries must name a definition.
fn cross_references(doc: &Document, definitions: &DefinitionSet) -> Vec<Violation> {
    let Some(section) = doc.raw().get("structure-config") else {
        return Vec::new();
    };
    let mut violations = Vec::new();
    for (field, category) in [("patterns", Category::Pattern), ("templates", Category::Template)] {
        let Some(names) = section.get(field).and_then(|v| v.as_array()) else {
            continue;
        };
        for (i, name) in names.iter().enumerate() {
            let Some(name) = name.as_str() else { continue };
            if !definitions.contains(category, name) {
                violations.push(Violation::new(
                    ViolationKind::DanglingReference,
                    doc.source_path(),
                    index_path(&format!("structure-config.{field}"), i),
                    format!("{category} `{name}` is not defined under {STRUCTURE_DIR}/{field}/"),
                ));
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common_fs::MemoryFileSystem;

    const ROOT: &str = "/project";
    const MINIMAL: &str = "version: 1.0.0\nproject-name: demo\n";

    async fn run(fs: &MemoryFileSystem, options: ValidateOptions) -> ValidationReport {
        Orchestrator::new(ROOT, options, fs).run().await
    }

    fn kinds(report: &ValidationReport) -> Vec<ViolationKind> {
        report.violations.iter().map(|v| v.kind).collect()
    }

    #[tokio::test]
    async fn test_no_structure_file_aborts() {
        let fs = MemoryFileSystem::new().with_file("/project/README.md", "hi");
        let report = run(&fs, ValidateOptions::default()).await;
        assert_eq!(report.outcome, crate::report::Outcome::Aborted);
        assert!(report.violations.is_empty());
        assert!(!report.passed);
        assert_eq!(report.abort.unwrap().kind, ViolationKind::NoStructureFile);
    }

    #[tokio::test]
    async fn test_root_file_lookup_order() {
        let fs = MemoryFileSystem::new()
            .with_file("/project/structure.yml", "version: nope\n")
            .with_file("/project/structure.yaml", MINIMAL);
        let report = run(&fs, ValidateOptions::default()).await;
        assert!(report.passed, "{report}");
    }

    #[tokio::test]
    async fn test_structure_dir_main_file_is_enough() {
        let fs = MemoryFileSystem::new().with_file("/project/.structure/structure.json", r#"{"version": "1.0.0", "project-name": "demo"}"#);
        let report = run(&fs, ValidateOptions::default()).await;
        assert!(report.passed, "{report}");
    }

    #[tokio::test]
    async fn test_unreadable_document_is_excluded() {
        let fs = MemoryFileSystem::new()
            .with_file("/project/structure.yaml", MINIMAL)
            .with_file("/project/.structure/patterns/bad.yaml", "name: [unclosed\n")
            .with_file("/project/.structure/patterns/good.yaml", "name: good\nversion: 1.0.0\n")
            .with_file("/project/.structure/patterns/notes.md", "ignored");
        let report = run(&fs, ValidateOptions::default()).await;
        assert_eq!(kinds(&report), vec![ViolationKind::ParseError]);
        assert_eq!(report.definitions.len(), 1);
    }

    #[tokio::test]
    async fn test_report_is_grouped_by_discovery_order() {
        let fs = MemoryFileSystem::new()
            .with_file("/project/structure.yaml", "version: 1.0.0\nproject-name: \"\"\n")
            .with_file("/project/.structure/config.yaml", "strict-mode: maybe\n")
            .with_file("/project/.structure/patterns/a.yaml", "name: a\nversion: 1.0.0\nextends: ghost\n")
            .with_file("/project/.structure/templates/t.yaml", "version: 1.0.0\n")
            .with_file("/project/.structure/hooks/pre-commit", "#!/bin/sh\n");
        let report = run(&fs, ValidateOptions::default()).await;
        assert_eq!(
            kinds(&report),
            vec![
                ViolationKind::ConstraintViolation,
                ViolationKind::TypeMismatch,
                ViolationKind::DanglingReference,
                ViolationKind::MissingField,
                ViolationKind::NotExecutable,
            ]
        );
    }

    #[tokio::test]
    async fn test_config_enables_strict_mode() {
        let fs = MemoryFileSystem::new()
            .with_file("/project/structure.yaml", format!("{MINIMAL}author: me\n"))
            .with_file("/project/.structure/config.yaml", "strict-mode: true\n");
        let report = run(&fs, ValidateOptions::default()).await;
        assert!(report.settings.strict_mode);
        assert_eq!(kinds(&report), vec![ViolationKind::UnknownField]);
        assert!(!report.passed);
    }

    #[tokio::test]
    async fn test_hooks_disabled_by_options() {
        let fs = MemoryFileSystem::new()
            .with_file("/project/structure.yaml", MINIMAL)
            .with_file("/project/.structure/hooks/pre-commit", "");
        let options = ValidateOptions {
            hooks_enabled: false,
            ..ValidateOptions::default()
        };
        let report = run(&fs, options).await;
        assert!(report.passed);
        assert!(report.hooks.is_empty());
    }

    #[tokio::test]
    async fn test_structure_config_cross_references() {
        let fs = MemoryFileSystem::new()
            .with_file(
                "/project/structure.yaml",
                format!("{MINIMAL}structure-config:\n  patterns: [api, ghost]\n  templates: [svc]\n"),
            )
            .with_file("/project/.structure/patterns/api.yaml", "name: api\nversion: 1.0.0\n")
            .with_file("/project/.structure/templates/svc.json", r#"{"name": "svc", "version": "1.0.0"}"#);
        let report = run(&fs, ValidateOptions::default()).await;
        assert_eq!(kinds(&report), vec![ViolationKind::DanglingReference]);
        assert_eq!(report.violations[0].field_path, "structure-config.patterns[1]");
    }

    #[tokio::test]
    async fn test_report_path_outside_root_is_forbidden() {
        let fs = MemoryFileSystem::new()
            .with_file("/project/structure.yaml", MINIMAL)
            .with_file("/project/.structure/config.yaml", "report:\n  path: ../report.json\n");
        let report = run(&fs, ValidateOptions::default()).await;
        assert_eq!(kinds(&report), vec![ViolationKind::ForbiddenPath]);
        assert_eq!(report.violations[0].field_path, "report.path");
    }

    #[tokio::test]
    async fn test_report_path_cannot_overwrite_a_document() {
        let fs = MemoryFileSystem::new()
            .with_file("/project/structure.yaml", MINIMAL)
            .with_file("/project/.structure/config.yaml", "report:\n  path: ./structure.yaml\n");
        let report = run(&fs, ValidateOptions::default()).await;
        assert_eq!(kinds(&report), vec![ViolationKind::ForbiddenPath]);
        assert_eq!(report.violations[0].field_path, "report.path");
        assert!(report.violations[0].message.contains("overwrite"));
    }

    #[tokio::test]
    async fn test_definitions_are_identified_by_declared_name() {
        let fs = MemoryFileSystem::new()
            .with_file(
                "/project/structure.yaml",
                format!("{MINIMAL}structure-config:\n  patterns: [rest-api, child]\n"),
            )
            .with_file("/project/.structure/patterns/api.yaml", "name: rest-api\nversion: 1.0.0\n")
            .with_file(
                "/project/.structure/patterns/child.yaml",
                "name: child\nversion: 1.0.0\nextends: rest-api\n",
            );
        let report = run(&fs, ValidateOptions::default()).await;
        assert!(report.passed, "{report}");
        assert!(report.violations.is_empty());
    }

    #[tokio::test]
    async fn test_two_files_declaring_one_name_are_duplicates() {
        let fs = MemoryFileSystem::new()
            .with_file("/project/structure.yaml", MINIMAL)
            .with_file("/project/.structure/patterns/a.yaml", "name: api\nversion: 1.0.0\n")
            .with_file("/project/.structure/patterns/b.yaml", "name: api\nversion: 1.0.0\n");
        let report = run(&fs, ValidateOptions::default()).await;
        assert_eq!(kinds(&report), vec![ViolationKind::DuplicateDefinition]);
        assert_eq!(
            report.violations[0].document_path,
            Path::new("/project/.structure/patterns/b.yaml")
        );
        assert!(!report.passed);
    }

    #[test]
    fn test_terminal_states() {
        assert!(RunState::Aborted.is_terminal());
        assert!(!RunState::ValidateAll.is_terminal());
        assert_eq!(RunState::LoadStructureTree.to_string(), "load-structure-tree");
    }
}
