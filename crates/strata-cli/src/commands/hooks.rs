//! Hooks command implementation.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;
use serde::Serialize;
use strata_common_config::ValidateOptions;
use strata_common_core::OptionExt;
use strata_common_fs::OsFileSystem;
use strata_engine::hooks::{HookDescriptor, HookInvocation, HookStatus};
use strata_engine::Outcome;
use tracing::warn;

use super::project_root;
use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{print_output, FormattedOutput};
use crate::runner::TokioProcessRunner;
use crate::Exit;

/// Inspect and run hook scripts from `.structure/hooks`
#[derive(Debug, Args)]
pub struct HooksCommand {
    /// Project directory
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,

    #[command(subcommand)]
    action: Option<HooksAction>,
}

#[derive(Debug, Subcommand)]
enum HooksAction {
    /// List discovered hooks and their effective settings
    List,

    /// Run a single hook
    Run {
        /// Hook name (script file stem)
        name: String,

        /// Extra environment for the hook
        #[arg(short, long = "env", value_name = "KEY=VALUE")]
        env: Vec<String>,
    },
}

#[derive(Debug, Serialize)]
struct HookList {
    hooks: Vec<HookDescriptor>,
}

impl FormattedOutput for HookList {
    fn format_text(&self) -> String {
        if self.hooks.is_empty() {
            return style("no hooks found").dim().to_string();
        }
        let width = self.hooks.iter().map(|h| h.name.len()).max().unwrap_or(0);
        self.hooks
            .iter()
            .map(|hook| {
                let state = if !hook.executable {
                    style("not executable").yellow()
                } else if hook.enabled {
                    style("enabled").green()
                } else {
                    style("disabled").dim()
                };
                let mut line = format!(
                    "{:<width$}  {:<14}  timeout {}s",
                    hook.name,
                    state.to_string(),
                    hook.timeout_seconds,
                    width = width
                );
                if hook.parallel {
                    line.push_str("  parallel");
                }
                if hook.ignore_errors {
                    line.push_str("  ignore-errors");
                }
                if !hook.is_known() {
                    line.push_str("  (custom)");
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl FormattedOutput for HookInvocation {
    fn format_text(&self) -> String {
        let mut out = String::new();
        if let Some(output) = &self.output {
            out.push_str(output.stdout.trim_end());
            if !output.stderr.trim().is_empty() {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(&style(output.stderr.trim_end()).dim().to_string());
            }
            if !out.is_empty() {
                out.push('\n');
            }
        }
        let status = match &self.status {
            HookStatus::Succeeded => style(format!("hook `{}` succeeded", self.name)).green(),
            HookStatus::Failed { exit_code } => style(format!(
                "hook `{}` failed with exit code {}",
                self.name,
                exit_code.map_or_else(|| "none".to_string(), |c| c.to_string())
            ))
            .red(),
            HookStatus::TimedOut => style(format!("hook `{}` timed out", self.name)).red(),
            HookStatus::Skipped { reason } => {
                style(format!("hook `{}` skipped: {reason}", self.name)).yellow()
            }
            HookStatus::Error { message } => {
                style(format!("hook `{}` could not run: {message}", self.name)).red()
            }
        };
        out.push_str(&status.bold().to_string());
        out
    }

    fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Parse `KEY=VALUE` pairs.
fn parse_env(pairs: &[String]) -> Result<HashMap<String, String>, CliError> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(CliError::usage_with_hint(
                format!("invalid environment pair `{pair}`"),
                "use KEY=VALUE",
            )),
        })
        .collect()
}

impl HooksCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<Exit, CliError> {
        let root = project_root(self.project.as_deref()).await?;
        let options = ValidateOptions {
            hooks_enabled: true,
            ..ValidateOptions::default()
        };
        let report = strata_engine::validate(&root, &options, &OsFileSystem::new()).await;

        if report.outcome == Outcome::Aborted {
            print_output(ctx, &report)?;
            return Ok(Exit::Aborted);
        }
        if !report.passed {
            warn!(
                errors = report.errors().count(),
                "project has validation errors; hook settings may be incomplete"
            );
        }

        match &self.action {
            None | Some(HooksAction::List) => {
                let list = HookList {
                    hooks: report.hooks.descriptors().cloned().collect(),
                };
                print_output(ctx, &list)?;
                Ok(Exit::Passed)
            }
            Some(HooksAction::Run { name, env }) => {
                report
                    .hooks
                    .get(name)
                    .ok_or_config(format!("no hook named `{name}` in .structure/hooks"))?;

                let mut env = parse_env(env)?;
                env.insert(
                    "STRATA_PROJECT_ROOT".to_string(),
                    root.display().to_string(),
                );
                env.insert("STRATA_HOOK".to_string(), name.clone());

                let invocation = report
                    .hooks
                    .invoke(name, &TokioProcessRunner, &root, &env)
                    .await;
                print_output(ctx, &invocation)?;

                Ok(if invocation.succeeded() {
                    Exit::Passed
                } else {
                    Exit::Failed
                })
            }
        }
    }
}
