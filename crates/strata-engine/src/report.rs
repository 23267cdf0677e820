//! The result of a validation run.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strata_common_config::{ReportFormat, Settings};
use strata_common_core::{Error, Result, ResultExt};

use crate::graph::{DefinitionKey, MergedDefinition};
use crate::hooks::HookRegistry;
use crate::violation::{Severity, Violation, ViolationKind};

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    Aborted,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::Failed => f.write_str("failed"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

/// Everything a run found, plus the merged definitions and hooks for
/// downstream consumers.
///
/// Serializes as `{passed, outcome, violations}` (and `abort` for aborted
/// runs); the merged definitions and hook descriptors are in-process only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// True iff no violation has Error severity or above.
    pub passed: bool,
    pub outcome: Outcome,
    pub violations: Vec<Violation>,
    /// The fatal finding that stopped an aborted run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort: Option<Violation>,
    #[serde(skip)]
    pub project_root: PathBuf,
    #[serde(skip)]
    pub settings: Settings,
    #[serde(skip)]
    pub definitions: IndexMap<DefinitionKey, MergedDefinition>,
    #[serde(skip)]
    pub hooks: HookRegistry,
}

impl ValidationReport {
    /// A finished run. The outcome follows from the violations.
    pub fn completed(
        project_root: impl Into<PathBuf>,
        settings: Settings,
        violations: Vec<Violation>,
        definitions: IndexMap<DefinitionKey, MergedDefinition>,
        hooks: HookRegistry,
    ) -> Self {
        let passed = !violations.iter().any(Violation::is_error);
        Self {
            passed,
            outcome: if passed {
                Outcome::Passed
            } else {
                Outcome::Failed
            },
            violations,
            abort: None,
            project_root: project_root.into(),
            settings,
            definitions,
            hooks,
        }
    }

    /// A run that stopped before validating anything.
    pub fn aborted(
        project_root: impl Into<PathBuf>,
        settings: Settings,
        reason: Violation,
    ) -> Self {
        Self {
            passed: false,
            outcome: Outcome::Aborted,
            violations: Vec::new(),
            abort: Some(reason),
            project_root: project_root.into(),
            settings,
            definitions: IndexMap::new(),
            hooks: HookRegistry::default(),
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Warning)
    }

    pub fn count_of(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Serialize in `format`.
    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Json => self
                .to_json()
                .with_context(|| format!("failed to serialize {} report as JSON", self.outcome)),
            ReportFormat::Yaml => self.to_yaml().context("failed to serialize report as YAML"),
        }
    }

    /// Write the serialized report to `path`, creating parent directories.
    pub async fn write_to(&self, path: &Path, format: ReportFormat) -> Result<()> {
        let content = self.render(format)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io("failed to create report directory", parent, e))?;
        }
        tokio::fs::write(path, content)
            .await
            .map_err(|e| Error::io("failed to write report", path, e))
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(reason) = &self.abort {
            return write!(f, "validation aborted: {}", reason.message);
        }
        for violation in &self.violations {
            writeln!(f, "{violation}")?;
        }
        let errors = self.errors().count();
        let warnings = self.warnings().count();
        write!(
            f,
            "validation {}: {errors} error(s), {warnings} warning(s)",
            self.outcome
        )
    }
}
