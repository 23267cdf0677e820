use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use strata_common_config::HookOverride;
use strata_common_fs::DirEntry;
use tracing::{debug, info, warn};

use super::runner::{ProcessOutput, ProcessRunner, RunnerError};
use crate::violation::{field_path, Severity, Violation, ViolationKind};

/// Hook names with a defined trigger.
pub const KNOWN_HOOKS: &[&str] = &[
    "pre-commit",
    "post-commit",
    "pre-push",
    "post-merge",
    "post-checkout",
    "post-update",
    "pre-validate",
    "post-validate",
];

/// A hook script and its effective settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookDescriptor {
    pub name: String,
    pub script_path: PathBuf,
    pub timeout_seconds: u64,
    pub enabled: bool,
    pub parallel: bool,
    pub ignore_errors: bool,
    pub executable: bool,
}

impl HookDescriptor {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn is_known(&self) -> bool {
        KNOWN_HOOKS.contains(&self.name.as_str())
    }

    /// Severity for failures of this hook.
    fn failure_severity(&self) -> Severity {
        if self.ignore_errors {
            Severity::Warning
        } else {
            Severity::Error
        }
    }
}

/// Outcome of one hook invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum HookStatus {
    Succeeded,
    Failed { exit_code: Option<i32> },
    TimedOut,
    Skipped { reason: String },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookInvocation {
    pub name: String,
    pub status: HookStatus,
    pub output: Option<ProcessOutput>,
    pub violation: Option<Violation>,
}

impl HookInvocation {
    fn new(name: &str, status: HookStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
            output: None,
            violation: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == HookStatus::Succeeded
    }
}

/// Hooks discovered in a project, ordered by name.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    hooks: IndexMap<String, HookDescriptor>,
}

impl HookRegistry {
    /// Build a registry from the listing of `hooks_dir` and the config's
    /// per-hook overrides (declared in the document at `config_path`).
    pub fn build(
        hooks_dir: &Path,
        entries: &[DirEntry],
        overrides: &IndexMap<String, HookOverride>,
        config_path: &Path,
    ) -> (Self, Vec<Violation>) {
        let mut hooks: IndexMap<String, HookDescriptor> = IndexMap::new();
        let mut violations = Vec::new();

        for entry in entries {
            if entry.is_dir() || entry.name.starts_with('.') {
                continue;
            }
            let name = entry.stem().to_string();
            if let Some(existing) = hooks.get(&name) {
                violations.push(Violation::new(
                    ViolationKind::DuplicateDefinition,
                    &entry.path,
                    "",
                    format!(
                        "hook `{name}` is already provided by {}",
                        existing.script_path.display()
                    ),
                ));
                continue;
            }

            let settings = overrides.get(&name).cloned().unwrap_or_default();
            let descriptor = HookDescriptor {
                name: name.clone(),
                script_path: entry.path.clone(),
                timeout_seconds: settings.timeout,
                enabled: settings.enabled,
                parallel: settings.parallel,
                ignore_errors: settings.ignore_errors,
                executable: entry.executable,
            };

            if !entry.executable {
                if !descriptor.is_known() {
                    debug!(
                        path = %entry.path.display(),
                        "skipping non-executable file in hooks directory"
                    );
                    continue;
                }
                violations.push(
                    Violation::new(
                        ViolationKind::NotExecutable,
                        &entry.path,
                        "",
                        format!("hook script `{}` is not executable", entry.name),
                    )
                    .with_severity(descriptor.failure_severity()),
                );
            }
            hooks.insert(name, descriptor);
        }

        for name in overrides.keys() {
            if !hooks.contains_key(name) {
                violations.push(Violation::new(
                    ViolationKind::DanglingHookReference,
                    config_path,
                    field_path("hooks", name),
                    format!(
                        "hook `{name}` is configured but {} has no such script",
                        hooks_dir.display()
                    ),
                ));
            }
        }

        hooks.sort_keys();
        (Self { hooks }, violations)
    }

    pub fn get(&self, name: &str) -> Option<&HookDescriptor> {
        self.hooks.get(name)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &HookDescriptor> {
        self.hooks.values()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run one hook, enforcing its timeout.
    pub async fn invoke(
        &self,
        name: &str,
        runner: &dyn ProcessRunner,
        cwd: &Path,
        env: &HashMap<String, String>,
    ) -> HookInvocation {
        let Some(hook) = self.hooks.get(name) else {
            return HookInvocation::new(
                name,
                HookStatus::Error {
                    message: format!("no hook named `{name}`"),
                },
            );
        };
        if !hook.enabled {
            return HookInvocation::new(
                name,
                HookStatus::Skipped {
                    reason: "disabled".to_string(),
                },
            );
        }
        if !hook.executable {
            return HookInvocation::new(
                name,
                HookStatus::Skipped {
                    reason: "not executable".to_string(),
                },
            );
        }

        info!(hook = name, timeout_secs = hook.timeout_seconds, "running hook");
        let run = runner.run(&hook.script_path, cwd, env, hook.timeout());
        let result = match tokio::time::timeout(hook.timeout(), run).await {
            Ok(result) => result,
            Err(_) => Err(RunnerError::TimedOut(hook.timeout())),
        };

        match result {
            Ok(output) => {
                let status = if output.success() {
                    HookStatus::Succeeded
                } else {
                    warn!(hook = name, exit_code = ?output.exit_code, "hook failed");
                    HookStatus::Failed {
                        exit_code: output.exit_code,
                    }
                };
                HookInvocation {
                    output: Some(output),
                    ..HookInvocation::new(name, status)
                }
            }
            Err(RunnerError::TimedOut(after)) => {
                warn!(hook = name, "hook timed out");
                let violation = Violation::new(
                    ViolationKind::HookTimeout,
                    &hook.script_path,
                    "",
                    format!("hook `{name}` timed out after {}s", after.as_secs()),
                )
                .with_severity(hook.failure_severity());
                HookInvocation {
                    violation: Some(violation),
                    ..HookInvocation::new(name, HookStatus::TimedOut)
                }
            }
            Err(e @ RunnerError::Spawn { .. }) => HookInvocation::new(
                name,
                HookStatus::Error {
                    message: e.to_string(),
                },
            ),
        }
    }

    /// Run every enabled hook in order. Consecutive `parallel` hooks run
    /// concurrently; results keep the registry order.
    pub async fn invoke_all(
        &self,
        runner: &dyn ProcessRunner,
        cwd: &Path,
        env: &HashMap<String, String>,
    ) -> Vec<HookInvocation> {
        let enabled: Vec<&HookDescriptor> = self.hooks.values().filter(|h| h.enabled).collect();
        let mut results = Vec::with_capacity(enabled.len());

        let mut i = 0;
        while i < enabled.len() {
            if !enabled[i].parallel {
                results.push(self.invoke(&enabled[i].name, runner, cwd, env).await);
                i += 1;
                continue;
            }
            let end = enabled[i..]
                .iter()
                .position(|h| !h.parallel)
                .map_or(enabled.len(), |n| i + n);
            let batch = enabled[i..end]
                .iter()
                .map(|h| self.invoke(&h.name, runner, cwd, env));
            results.extend(join_all(batch).await);
            i = end;
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use strata_common_fs::{EntryKind, FileSystem, MemoryFileSystem};

    const HOOKS_DIR: &str = "/p/.structure/hooks";
    const CONFIG: &str = "/p/.structure/config.yaml";

    async fn entries(fs: &MemoryFileSystem) -> Vec<DirEntry> {
        fs.list_directory(Path::new(HOOKS_DIR)).await.unwrap()
    }

    fn overrides(pairs: &[(&str, HookOverride)]) -> IndexMap<String, HookOverride> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn build(
        entries: &[DirEntry],
        ov: &IndexMap<String, HookOverride>,
    ) -> (HookRegistry, Vec<Violation>) {
        HookRegistry::build(Path::new(HOOKS_DIR), entries, ov, Path::new(CONFIG))
    }

    /// Exit codes and delays keyed by script file name.
    #[derive(Default)]
    struct ScriptedRunner {
        scripts: HashMap<String, (i32, Duration)>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn script(mut self, name: &str, exit_code: i32, delay_secs: u64) -> Self {
            self.scripts
                .insert(name.to_string(), (exit_code, Duration::from_secs(delay_secs)));
            self
        }
    }

    #[async_trait]
    impl ProcessRunner for ScriptedRunner {
        async fn run(
            &self,
            command: &Path,
            _cwd: &Path,
            _env: &HashMap<String, String>,
            _timeout: Duration,
        ) -> Result<ProcessOutput, RunnerError> {
            let name = command.file_name().unwrap().to_string_lossy().into_owned();
            self.calls.lock().unwrap().push(name.clone());
            let Some(&(code, delay)) = self.scripts.get(&name) else {
                return Err(RunnerError::Spawn {
                    command: command.to_path_buf(),
                    message: "no such script".to_string(),
                });
            };
            tokio::time::sleep(delay).await;
            Ok(ProcessOutput {
                exit_code: Some(code),
                stdout: format!("{name} ran"),
                stderr: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_build_orders_by_name_and_applies_overrides() {
        let fs = MemoryFileSystem::new()
            .with_executable(format!("{HOOKS_DIR}/pre-push.sh"), "#!/bin/sh")
            .with_executable(format!("{HOOKS_DIR}/post-commit"), "#!/bin/sh")
            .with_file(format!("{HOOKS_DIR}/.gitkeep"), "")
            .with_dir(format!("{HOOKS_DIR}/lib"));
        let ov = overrides(&[(
            "pre-push",
            HookOverride {
                timeout: 5,
                parallel: true,
                ..HookOverride::default()
            },
        )]);
        let (registry, violations) = build(&entries(&fs).await, &ov);
        assert!(violations.is_empty());

        let names: Vec<_> = registry.descriptors().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["post-commit", "pre-push"]);
        let push = registry.get("pre-push").unwrap();
        assert_eq!(push.timeout_seconds, 5);
        assert!(push.parallel);
        assert_eq!(registry.get("post-commit").unwrap().timeout_seconds, 30);
    }

    #[tokio::test]
    async fn test_non_executable_known_hook() {
        let fs = MemoryFileSystem::new()
            .with_file(format!("{HOOKS_DIR}/pre-commit"), "#!/bin/sh")
            .with_file(format!("{HOOKS_DIR}/notes.txt"), "just notes");
        let (registry, violations) = build(&entries(&fs).await, &IndexMap::new());

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::NotExecutable);
        assert_eq!(violations[0].severity, Severity::Error);
        assert!(registry.get("notes").is_none());
        assert!(!registry.get("pre-commit").unwrap().executable);
    }

    #[tokio::test]
    async fn test_ignore_errors_downgrades_not_executable() {
        let fs = MemoryFileSystem::new().with_file(format!("{HOOKS_DIR}/pre-commit"), "");
        let ov = overrides(&[(
            "pre-commit",
            HookOverride {
                ignore_errors: true,
                ..HookOverride::default()
            },
        )]);
        let (_, violations) = build(&entries(&fs).await, &ov);
        assert_eq!(violations[0].severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_override_without_script_is_dangling() {
        let fs = MemoryFileSystem::new().with_executable(format!("{HOOKS_DIR}/pre-commit"), "");
        let ov = overrides(&[("pre-push", HookOverride::default())]);
        let (_, violations) = build(&entries(&fs).await, &ov);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::DanglingHookReference);
        assert_eq!(violations[0].document_path, Path::new(CONFIG));
        assert_eq!(violations[0].field_path, "hooks.pre-push");
    }

    #[test]
    fn test_duplicate_stem() {
        let entry = |name: &str| DirEntry {
            path: Path::new(HOOKS_DIR).join(name),
            name: name.to_string(),
            kind: EntryKind::File,
            executable: true,
            symlink: false,
        };
        let (registry, violations) =
            build(&[entry("pre-commit"), entry("pre-commit.sh")], &IndexMap::new());
        assert_eq!(registry.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::DuplicateDefinition);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_outcomes() {
        let fs = MemoryFileSystem::new()
            .with_executable(format!("{HOOKS_DIR}/pre-commit"), "")
            .with_executable(format!("{HOOKS_DIR}/pre-push"), "")
            .with_executable(format!("{HOOKS_DIR}/post-merge"), "");
        let ov = overrides(&[(
            "post-merge",
            HookOverride {
                timeout: 2,
                ignore_errors: true,
                ..HookOverride::default()
            },
        )]);
        let (registry, _) = build(&entries(&fs).await, &ov);
        let runner = ScriptedRunner::default()
            .script("pre-commit", 0, 0)
            .script("pre-push", 3, 0)
            .script("post-merge", 0, 60);
        let env = HashMap::new();
        let cwd = Path::new("/p");

        let ok = registry.invoke("pre-commit", &runner, cwd, &env).await;
        assert!(ok.succeeded());
        assert_eq!(ok.output.unwrap().stdout, "pre-commit ran");

        let failed = registry.invoke("pre-push", &runner, cwd, &env).await;
        assert_eq!(failed.status, HookStatus::Failed { exit_code: Some(3) });
        assert!(failed.violation.is_none());

        let slow = registry.invoke("post-merge", &runner, cwd, &env).await;
        assert_eq!(slow.status, HookStatus::TimedOut);
        let violation = slow.violation.unwrap();
        assert_eq!(violation.kind, ViolationKind::HookTimeout);
        assert_eq!(violation.severity, Severity::Warning);

        let missing = registry.invoke("post-update", &runner, cwd, &env).await;
        assert!(matches!(missing.status, HookStatus::Error { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_waits_for_slow_hook_within_timeout() {
        use tokio_test::{assert_pending, assert_ready};

        let fs = MemoryFileSystem::new().with_executable(format!("{HOOKS_DIR}/pre-push"), "");
        let (registry, _) = build(&entries(&fs).await, &IndexMap::new());
        let runner = ScriptedRunner::default().script("pre-push", 0, 10);
        let env = HashMap::new();

        let mut invocation =
            tokio_test::task::spawn(registry.invoke("pre-push", &runner, Path::new("/p"), &env));
        assert_pending!(invocation.poll());

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_pending!(invocation.poll());

        tokio::time::advance(Duration::from_secs(6)).await;
        let result = assert_ready!(invocation.poll());
        assert!(result.succeeded());
        assert!(result.violation.is_none());
    }

    #[tokio::test]
    async fn test_disabled_hooks_are_skipped() {
        let fs = MemoryFileSystem::new().with_executable(format!("{HOOKS_DIR}/pre-commit"), "");
        let ov = overrides(&[(
            "pre-commit",
            HookOverride {
                enabled: false,
                ..HookOverride::default()
            },
        )]);
        let (registry, _) = build(&entries(&fs).await, &ov);
        let runner = ScriptedRunner::default();
        let result = registry
            .invoke("pre-commit", &runner, Path::new("/p"), &HashMap::new())
            .await;
        assert!(matches!(result.status, HookStatus::Skipped { .. }));
        assert!(runner.calls.lock().unwrap().is_empty());

        let all = registry
            .invoke_all(&runner, Path::new("/p"), &HashMap::new())
            .await;
        assert!(all.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_all_keeps_declared_order() {
        let fs = MemoryFileSystem::new()
            .with_executable(format!("{HOOKS_DIR}/post-checkout"), "")
            .with_executable(format!("{HOOKS_DIR}/post-commit"), "")
            .with_executable(format!("{HOOKS_DIR}/pre-commit"), "");
        let parallel = HookOverride {
            parallel: true,
            ..HookOverride::default()
        };
        let ov = overrides(&[("post-checkout", parallel.clone()), ("post-commit", parallel)]);
        let (registry, _) = build(&entries(&fs).await, &ov);
        let runner = ScriptedRunner::default()
            .script("post-checkout", 0, 5)
            .script("post-commit", 0, 1)
            .script("pre-commit", 0, 0);

        let results = registry
            .invoke_all(&runner, Path::new("/p"), &HashMap::new())
            .await;
        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["post-checkout", "post-commit", "pre-commit"]);
        assert!(results.iter().all(HookInvocation::succeeded));
        assert_eq!(runner.calls.lock().unwrap().len(), 3);
    }
}
