//! Configuration types.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default hook timeout in seconds.
pub const DEFAULT_HOOK_TIMEOUT_SECS: u64 = 30;

/// Typed view of `.structure/config.yaml`.
///
/// Every field has a default, so a partial file (or none) is always usable.
/// Shape errors are reported by the engine's schema validator; this type only
/// provides the values once the document is known to be well-formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StructureConfig {
    /// Report unknown fields as errors instead of warnings.
    pub strict_mode: bool,
    /// Check that declared paths exist on disk.
    pub validate_paths: bool,
    /// Build the hook registry.
    pub hooks_enabled: bool,
    /// Path prefixes skipped by directory walks.
    pub ignore: Vec<String>,
    /// Optional report file written at the end of a run.
    pub report: Option<ReportConfig>,
    /// Per-hook overrides, in declaration order.
    pub hooks: IndexMap<String, HookOverride>,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            validate_paths: false,
            hooks_enabled: true,
            ignore: Vec::new(),
            report: None,
            hooks: IndexMap::new(),
        }
    }
}

/// Override of a single hook's execution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HookOverride {
    pub enabled: bool,
    /// Timeout in seconds.
    pub timeout: u64,
    /// May run concurrently with adjacent parallel hooks.
    pub parallel: bool,
    /// Failures and timeouts are downgraded to warnings.
    pub ignore_errors: bool,
}

impl Default for HookOverride {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: DEFAULT_HOOK_TIMEOUT_SECS,
            parallel: false,
            ignore_errors: false,
        }
    }
}

/// Where and how to write the validation report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output file, relative to the project root.
    pub path: PathBuf,
    #[serde(default)]
    pub format: ReportFormat,
}

/// Report serialization format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Yaml,
}
