//! Path resolution and directory-shape checks.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use strata_common_fs::path::{has_prefix, relative_to, resolve_within};
use strata_common_fs::FileSystem;
use tracing::debug;

use crate::document::{Document, DocumentKind, Value};
use crate::schema::path_fields;
use crate::violation::{index_path, Violation, ViolationKind};

/// Walk depth used for `forbidden` checks when `max-depth` is not set.
pub const DEFAULT_WALK_DEPTH: usize = 8;

/// Directory names the shape walk never enters.
const SKIPPED_DIRS: &[&str] = &[".git", ".structure"];

/// Checks that declared paths stay inside the project and, optionally, exist.
#[derive(Debug, Clone)]
pub struct PathResolver {
    project_root: PathBuf,
    validate_paths: bool,
    ignore: Vec<PathBuf>,
}

impl PathResolver {
    /// `ignore` holds root-relative prefixes the directory walk skips.
    pub fn new(project_root: impl Into<PathBuf>, validate_paths: bool, ignore: &[String]) -> Self {
        Self {
            project_root: project_root.into(),
            validate_paths,
            ignore: ignore.iter().map(PathBuf::from).collect(),
        }
    }

    /// Report every path problem in `document`.
    pub async fn check(&self, document: &Document, fs: &dyn FileSystem) -> Vec<Violation> {
        let mut violations = Vec::new();

        for field in path_fields(document) {
            match resolve_within(document.base_directory(), &field.value, &self.project_root) {
                Err(resolved) => violations.push(Violation::new(
                    ViolationKind::ForbiddenPath,
                    document.source_path(),
                    &field.field_path,
                    format!(
                        "`{}` resolves to {} outside the project root",
                        field.value,
                        resolved.display()
                    ),
                )),
                Ok(resolved) => {
                    if self.validate_paths
                        && !is_glob(&field.value)
                        && !fs.exists(&resolved).await
                    {
                        violations.push(Violation::new(
                            ViolationKind::PathNotFound,
                            document.source_path(),
                            &field.field_path,
                            format!("`{}` does not exist", field.value),
                        ));
                    }
                }
            }
        }

        if document.kind() == DocumentKind::RootStructure {
            if let Some(rules) = document.raw().get("rules").filter(|r| r.as_object().is_some()) {
                self.check_rules(document, rules, fs, &mut violations).await;
            }
        }

        violations
    }

    async fn check_rules(
        &self,
        document: &Document,
        rules: &Value,
        fs: &dyn FileSystem,
        violations: &mut Vec<Violation>,
    ) {
        let base = document.base_directory();

        for (i, declared) in string_list(rules.get("required-directories")) {
            let field = index_path("rules.required-directories", i);
            match resolve_within(base, declared, &self.project_root) {
                Err(resolved) => violations.push(Violation::new(
                    ViolationKind::ForbiddenPath,
                    document.source_path(),
                    field,
                    format!(
                        "`{declared}` resolves to {} outside the project root",
                        resolved.display()
                    ),
                )),
                Ok(resolved) => {
                    if !fs.is_dir(&resolved).await {
                        violations.push(Violation::new(
                            ViolationKind::MissingDirectory,
                            document.source_path(),
                            field,
                            format!("required directory `{declared}` does not exist"),
                        ));
                    }
                }
            }
        }

        let forbidden: Vec<(usize, PathBuf)> = string_list(rules.get("forbidden"))
            .map(|(i, prefix)| (i, strata_common_fs::path::normalize(prefix)))
            .collect();
        let max_depth = rules
            .get("max-depth")
            .and_then(Value::as_i64)
            .filter(|d| *d >= 1)
            .map(|d| d as usize);

        if forbidden.is_empty() && max_depth.is_none() {
            return;
        }

        let walk = ShapeWalk {
            resolver: self,
            document,
            forbidden: &forbidden,
            max_depth,
        };
        walk.run(base, fs, violations).await;
    }

    fn is_ignored(&self, relative: &Path) -> bool {
        self.ignore.iter().any(|prefix| has_prefix(relative, prefix))
    }
}

/// Breadth-first walk of the base directory for `forbidden` / `max-depth`.
struct ShapeWalk<'a> {
    resolver: &'a PathResolver,
    document: &'a Document,
    forbidden: &'a [(usize, PathBuf)],
    max_depth: Option<usize>,
}

impl ShapeWalk<'_> {
    async fn run(&self, base: &Path, fs: &dyn FileSystem, violations: &mut Vec<Violation>) {
        let limit = self.max_depth.unwrap_or(DEFAULT_WALK_DEPTH);
        let mut queue = VecDeque::from([(base.to_path_buf(), 0usize)]);

        while let Some((dir, depth)) = queue.pop_front() {
            let entries = match fs.list_directory(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                    continue;
                }
            };

            for entry in entries {
                if entry.is_dir() && SKIPPED_DIRS.contains(&entry.name.as_str()) {
                    continue;
                }
                let relative = relative_to(&entry.path, &self.resolver.project_root)
                    .unwrap_or_else(|| entry.path.clone());
                if self.resolver.is_ignored(&relative) {
                    continue;
                }

                if let Some((index, prefix)) = self
                    .forbidden
                    .iter()
                    .find(|(_, prefix)| has_prefix(&relative, prefix))
                {
                    violations.push(Violation::new(
                        ViolationKind::ForbiddenPath,
                        self.document.source_path(),
                        index_path("rules.forbidden", *index),
                        format!(
                            "`{}` matches forbidden prefix `{}`",
                            relative.display(),
                            prefix.display()
                        ),
                    ));
                    continue;
                }

                // Linked directories are not descended into; a link back to an
                // ancestor would otherwise re-walk the tree at every level.
                if !entry.is_dir() || entry.symlink {
                    continue;
                }
                let level = depth + 1;
                if level > limit {
                    if let Some(max) = self.max_depth {
                        violations.push(Violation::new(
                            ViolationKind::ConstraintViolation,
                            self.document.source_path(),
                            "rules.max-depth",
                            format!(
                                "`{}` is nested {level} levels deep, deeper than max-depth {max}",
                                relative.display()
                            ),
                        ));
                    }
                    continue;
                }
                queue.push_back((entry.path, level));
            }
        }
    }
}

/// Non-empty string elements of an optional array, with their indices.
fn string_list(value: Option<&Value>) -> impl Iterator<Item = (usize, &str)> {
    value
        .and_then(Value::as_array)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.as_str().filter(|s| !s.trim().is_empty()).map(|s| (i, s)))
}

fn is_glob(path: &str) -> bool {
    path.contains(['*', '?', '['])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{load, Format};
    use strata_common_fs::MemoryFileSystem;

    fn root_doc(text: &str) -> Document {
        load(
            DocumentKind::RootStructure,
            "/project/structure.yaml",
            text.as_bytes(),
            Format::Yaml,
        )
        .unwrap()
    }

    fn header(extra: &str) -> String {
        format!("version: 1.0.0\nproject-name: demo\n{extra}")
    }

    fn kinds(violations: &[Violation]) -> Vec<(ViolationKind, &str)> {
        violations
            .iter()
            .map(|v| (v.kind, v.field_path.as_str()))
            .collect()
    }

    #[tokio::test]
    async fn test_traversal_is_forbidden_without_path_validation() {
        let doc = root_doc(&header("key_files:\n  - path: ../../etc/passwd\n"));
        let fs = MemoryFileSystem::new();
        let v = PathResolver::new("/project", false, &[]).check(&doc, &fs).await;
        assert_eq!(kinds(&v), vec![(ViolationKind::ForbiddenPath, "key_files[0].path")]);
        assert!(v[0].message.contains("/etc/passwd"));
    }

    #[tokio::test]
    async fn test_absolute_path_outside_root_is_forbidden() {
        let doc = root_doc(&header("key_files:\n  - path: /etc/hosts\n  - path: /project/src\n"));
        let fs = MemoryFileSystem::new().with_dir("/project/src");
        let v = PathResolver::new("/project", true, &[]).check(&doc, &fs).await;
        assert_eq!(kinds(&v), vec![(ViolationKind::ForbiddenPath, "key_files[0].path")]);
    }

    #[tokio::test]
    async fn test_missing_paths_only_reported_when_validating() {
        let doc = root_doc(&header(
            "key_files:\n  - path: src/main.rs\n  - path: src/lib.rs\n  - path: \"docs/*.md\"\n",
        ));
        let fs = MemoryFileSystem::new().with_file("/project/src/main.rs", "fn main() {}");

        let lenient = PathResolver::new("/project", false, &[]).check(&doc, &fs).await;
        assert!(lenient.is_empty());

        let v = PathResolver::new("/project", true, &[]).check(&doc, &fs).await;
        assert_eq!(kinds(&v), vec![(ViolationKind::PathNotFound, "key_files[1].path")]);
    }

    #[tokio::test]
    async fn test_required_directories() {
        let doc = root_doc(&header(
            "rules:\n  required-directories: [src, tests, ../outside]\n",
        ));
        let fs = MemoryFileSystem::new()
            .with_dir("/project/src")
            .with_file("/project/tests", "not a dir");
        let v = PathResolver::new("/project", false, &[]).check(&doc, &fs).await;
        assert_eq!(
            kinds(&v),
            vec![
                (ViolationKind::MissingDirectory, "rules.required-directories[1]"),
                (ViolationKind::ForbiddenPath, "rules.required-directories[2]"),
            ]
        );
    }

    #[tokio::test]
    async fn test_forbidden_prefixes_match_whole_components() {
        let doc = root_doc(&header("rules:\n  forbidden: [tmp, src/generated]\n"));
        let fs = MemoryFileSystem::new()
            .with_file("/project/tmp/scratch.txt", "")
            .with_file("/project/src/generated/a.rs", "")
            .with_file("/project/src/generated-docs/b.md", "")
            .with_file("/project/.git/tmp/x", "");
        let v = PathResolver::new("/project", false, &[]).check(&doc, &fs).await;
        assert_eq!(
            kinds(&v),
            vec![
                (ViolationKind::ForbiddenPath, "rules.forbidden[0]"),
                (ViolationKind::ForbiddenPath, "rules.forbidden[1]"),
            ]
        );
        assert!(v[0].message.contains("`tmp`"));
    }

    #[tokio::test]
    async fn test_ignored_prefixes_are_not_walked() {
        let doc = root_doc(&header("rules:\n  forbidden: [tmp]\n"));
        let fs = MemoryFileSystem::new().with_file("/project/vendor/tmp/x", "");
        let walked = PathResolver::new("/project", false, &[]).check(&doc, &fs).await;
        assert!(walked.is_empty(), "vendor/tmp does not start with tmp");

        let fs = fs.with_file("/project/tmp/y", "");
        let ignored = PathResolver::new("/project", false, &["tmp".to_string()])
            .check(&doc, &fs)
            .await;
        assert!(ignored.is_empty());
    }

    #[tokio::test]
    async fn test_max_depth() {
        let doc = root_doc(&header("rules:\n  max-depth: 2\n"));
        let fs = MemoryFileSystem::new()
            .with_file("/project/src/api/mod.rs", "")
            .with_file("/project/src/api/v1/handlers.rs", "");
        let v = PathResolver::new("/project", false, &[]).check(&doc, &fs).await;
        assert_eq!(kinds(&v), vec![(ViolationKind::ConstraintViolation, "rules.max-depth")]);
        assert!(v[0].message.contains("src/api/v1"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_directories_are_not_descended() {
        use strata_common_fs::OsFileSystem;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("src/lib.rs"), "").unwrap();
        std::os::unix::fs::symlink(root.join("src"), root.join("src/again")).unwrap();

        let text = header("rules:\n  max-depth: 3\n");
        let doc = load(
            DocumentKind::RootStructure,
            root.join("structure.yaml"),
            text.as_bytes(),
            Format::Yaml,
        )
        .unwrap();
        let v = PathResolver::new(root, false, &[])
            .check(&doc, &OsFileSystem::new())
            .await;
        assert!(v.is_empty(), "{v:?}");
    }

    #[tokio::test]
    async fn test_pattern_reference_outside_root() {
        let doc = load(
            DocumentKind::Pattern,
            "/project/.structure/patterns/api.yaml",
            b"name: api\nversion: 1.0.0\nreference: ../../../etc/passwd\n",
            Format::Yaml,
        )
        .unwrap()
        .with_base_directory("/project");
        let v = PathResolver::new("/project", false, &[])
            .check(&doc, &MemoryFileSystem::new())
            .await;
        assert_eq!(kinds(&v), vec![(ViolationKind::ForbiddenPath, "reference")]);
    }

    #[test]
    fn test_glob_detection() {
        assert!(is_glob("src/**/*.rs"));
        assert!(is_glob("file?.txt"));
        assert!(!is_glob("src/main.rs"));
    }
}
