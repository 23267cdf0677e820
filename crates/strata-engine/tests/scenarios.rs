//! End-to-end validation runs against on-disk and in-memory projects.

use strata_common_fs::{MemoryFileSystem, OsFileSystem};
use strata_engine::graph::Category;
use strata_engine::{validate, Outcome, Severity, ValidateOptions, ViolationKind};
use strata_test_utils::ProjectFixture;

const MINIMAL: &str = "version: 1.0.0\nproject-name: demo\n";

fn kinds(report: &strata_engine::ValidationReport) -> Vec<ViolationKind> {
    report.violations.iter().map(|v| v.kind).collect()
}

#[tokio::test]
async fn no_structure_file_aborts_the_run() {
    let project = ProjectFixture::new().file("README.md", "# nothing").dir("src");
    let report = validate(project.path(), &ValidateOptions::default(), &OsFileSystem::new()).await;

    assert_eq!(report.outcome, Outcome::Aborted);
    assert!(report.violations.is_empty());
    assert!(!report.passed);
    assert_eq!(report.abort.as_ref().map(|v| v.kind), Some(ViolationKind::NoStructureFile));
}

#[tokio::test]
async fn minimal_project_passes() {
    let project = ProjectFixture::new().minimal();
    let report = validate(project.path(), &ValidateOptions::default(), &OsFileSystem::new()).await;
    assert!(report.passed, "{report}");
    assert_eq!(report.outcome, Outcome::Passed);
    assert!(report.violations.is_empty());
}

#[tokio::test]
async fn empty_project_name_is_one_constraint_violation() {
    let project = ProjectFixture::new().file("structure.yaml", "version: 1.0.0\nproject-name: \"\"\n");
    let report = validate(project.path(), &ValidateOptions::default(), &OsFileSystem::new()).await;

    assert_eq!(kinds(&report), vec![ViolationKind::ConstraintViolation]);
    assert_eq!(report.violations[0].field_path, "project-name");
    assert!(!report.passed);
}

#[tokio::test]
async fn dangling_override_still_produces_merged_pattern() {
    let project = ProjectFixture::new()
        .minimal()
        .file(
            ".structure/patterns/api.yaml",
            "name: api\nversion: 1.0.0\nrules:\n  - name: Versioning\n",
        )
        .file(
            ".structure/patterns/custom.yaml",
            "name: custom\nversion: 1.0.0\nextends: \"api.yaml\"\noverride:\n  - name: Authentication\n    severity: error\nadd:\n  - name: RateLimiting\n",
        );
    let report = validate(project.path(), &ValidateOptions::default(), &OsFileSystem::new()).await;

    assert_eq!(kinds(&report), vec![ViolationKind::DanglingOverride]);
    assert_eq!(report.violations[0].field_path, "override[0]");
    let custom = report
        .definitions
        .values()
        .find(|d| d.key.category == Category::Pattern && d.key.name == "custom")
        .expect("custom pattern is merged");
    assert_eq!(custom.entry_names(), vec!["Versioning", "RateLimiting"]);
    assert!(custom.entry("Authentication").is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn non_executable_pre_commit_fails_validation() {
    let project = ProjectFixture::new()
        .minimal()
        .plain(".structure/hooks/pre-commit", "#!/bin/sh\nexit 0\n")
        .executable(".structure/hooks/post-merge", "#!/bin/sh\nexit 0\n");
    let report = validate(project.path(), &ValidateOptions::default(), &OsFileSystem::new()).await;

    assert_eq!(kinds(&report), vec![ViolationKind::NotExecutable]);
    assert_eq!(report.violations[0].severity, Severity::Error);
    assert!(!report.passed);
    assert_eq!(report.hooks.len(), 2);
}

#[cfg(unix)]
#[tokio::test]
async fn ignore_errors_turns_not_executable_into_warning() {
    let project = ProjectFixture::new()
        .minimal()
        .file(".structure/config.yaml", "hooks:\n  pre-commit:\n    ignore-errors: true\n")
        .plain(".structure/hooks/pre-commit", "#!/bin/sh\n");
    let report = validate(project.path(), &ValidateOptions::default(), &OsFileSystem::new()).await;

    assert_eq!(kinds(&report), vec![ViolationKind::NotExecutable]);
    assert_eq!(report.violations[0].severity, Severity::Warning);
    assert!(report.passed);
}

#[tokio::test]
async fn path_traversal_is_forbidden_regardless_of_options() {
    let text = format!("{MINIMAL}key_files:\n  - path: ../../etc/passwd\n    description: nope\n");
    for validate_paths in [false, true] {
        let fs = MemoryFileSystem::new().with_file("/work/app/structure.yaml", text.as_str());
        let options = ValidateOptions {
            validate_paths,
            ..ValidateOptions::default()
        };
        let report = validate("/work/app", &options, &fs).await;
        assert_eq!(kinds(&report), vec![ViolationKind::ForbiddenPath]);
    }
}

#[tokio::test]
async fn validate_paths_reports_missing_files() {
    let project = ProjectFixture::new()
        .file(
            "structure.yaml",
            format!("{MINIMAL}key_files:\n  - path: src/main.rs\n  - path: src/missing.rs\nrules:\n  required-directories: [src, docs]\n"),
        )
        .file("src/main.rs", "fn main() {}\n");
    let options = ValidateOptions {
        validate_paths: true,
        ..ValidateOptions::default()
    };
    let report = validate(project.path(), &options, &OsFileSystem::new()).await;

    assert_eq!(
        kinds(&report),
        vec![ViolationKind::PathNotFound, ViolationKind::MissingDirectory]
    );
    assert_eq!(report.violations[0].field_path, "key_files[1].path");
}

#[tokio::test]
async fn mutual_extends_reports_one_cycle() {
    let fs = MemoryFileSystem::new()
        .with_file("/p/structure.yaml", MINIMAL)
        .with_file("/p/.structure/patterns/a.yaml", "name: a\nversion: 1.0.0\nextends: b\n")
        .with_file("/p/.structure/patterns/b.yaml", "name: b\nversion: 1.0.0\nextends: a\n");
    let report = validate("/p", &ValidateOptions::default(), &fs).await;

    assert_eq!(report.count_of(ViolationKind::CircularDependency), 1);
    assert!(report.definitions.is_empty());
}

#[tokio::test]
async fn template_placeholders_must_name_variables() {
    let fs = MemoryFileSystem::new()
        .with_file("/p/structure.yaml", MINIMAL)
        .with_file(
            "/p/.structure/templates/service.yaml",
            "name: service\nversion: 1.0.0\nvariables:\n  - name: service_name\n    type: string\n    required: true\nstructure:\n  - path: \"src/{{ service_name }}/mod.rs\"\n  - path: \"src/{{ servce_name }}/api.rs\"\n",
        );
    let report = validate("/p", &ValidateOptions::default(), &fs).await;

    assert_eq!(kinds(&report), vec![ViolationKind::UndefinedVariable]);
    assert_eq!(report.violations[0].field_path, "structure[1].path");
}

#[tokio::test]
async fn duplicate_keys_exclude_the_document() {
    let fs = MemoryFileSystem::new()
        .with_file("/p/structure.yaml", MINIMAL)
        .with_file(
            "/p/.structure/config.json",
            r#"{"strict-mode": true, "strict-mode": false}"#,
        );
    let report = validate("/p", &ValidateOptions::default(), &fs).await;

    assert_eq!(kinds(&report), vec![ViolationKind::ParseError]);
    assert!(!report.settings.strict_mode);
}

#[tokio::test]
async fn configured_report_is_written() {
    let project = ProjectFixture::new()
        .file("structure.yaml", format!("{MINIMAL}extra: field\n"))
        .file(".structure/config.yaml", "report:\n  path: target/structure-report.json\n");
    let report = validate(project.path(), &ValidateOptions::default(), &OsFileSystem::new()).await;
    assert!(report.passed);

    let written = std::fs::read_to_string(project.join("target/structure-report.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(json["passed"], true);
    assert_eq!(json["outcome"], "passed");
    assert_eq!(json["violations"][0]["kind"], "UnknownField");
    assert_eq!(json["violations"][0]["severity"], "warning");
}
