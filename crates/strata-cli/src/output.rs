//! Output formatting utilities for CLI commands.

use std::path::Path;

use console::{style, Emoji};
use serde::Serialize;
use strata_engine::{Outcome, Severity, ValidationReport, Violation};

use crate::cli::{CommandContext, OutputFormat};
use crate::error::CliError;

static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "! ");
static CHECK: Emoji<'_, '_> = Emoji("✓ ", "");

/// Trait for types that can be formatted for output
pub trait FormattedOutput {
    fn format_text(&self) -> String;
    fn format_json(&self) -> Result<String, serde_json::Error>;
}

/// Print formatted output to stdout
pub fn print_output<T>(ctx: &CommandContext, value: &T) -> Result<(), CliError>
where
    T: FormattedOutput + Serialize,
{
    let output = match ctx.format {
        OutputFormat::Text => value.format_text(),
        OutputFormat::Json => value.format_json().map_err(|e| {
            strata_common_core::Error::Serialization(e.to_string())
        })?,
    };

    println!("{output}");
    Ok(())
}

/// Print an error and its hint to stderr.
pub fn print_error(err: &CliError) {
    eprintln!("{}{} {err}", CROSS, style("error:").red().bold());
    if let Some(hint) = err.hint() {
        eprintln!("  {} {hint}", style("hint:").cyan());
    }
}

impl FormattedOutput for ValidationReport {
    fn format_text(&self) -> String {
        let mut out = String::new();

        if let Some(reason) = &self.abort {
            out.push_str(&violation_line(reason, &self.project_root));
            out.push('\n');
            out.push_str(&format!("{}", style("validation aborted").red().bold()));
            return out;
        }

        for violation in &self.violations {
            out.push_str(&violation_line(violation, &self.project_root));
            out.push('\n');
        }

        let errors = self.errors().count();
        let warnings = self.warnings().count();
        let summary = format!(
            "validation {}: {} error(s), {} warning(s)",
            self.outcome, errors, warnings
        );
        let summary = match self.outcome {
            Outcome::Passed => format!("{}{}", CHECK, style(summary).green().bold()),
            Outcome::Failed | Outcome::Aborted => format!("{}", style(summary).red().bold()),
        };
        out.push_str(&summary);
        out
    }

    fn format_json(&self) -> Result<String, serde_json::Error> {
        self.to_json()
    }
}

/// One violation, with its document path shown relative to `root`.
fn violation_line(violation: &Violation, root: &Path) -> String {
    let label = match violation.severity {
        Severity::Warning => format!("{}{}", WARN, style("warning").yellow().bold()),
        Severity::Error => format!("{}{}", CROSS, style("error").red().bold()),
        Severity::Fatal => format!("{}{}", CROSS, style("fatal").red().bold().underlined()),
    };

    let path = strata_common_fs::path::relative_to(&violation.document_path, root)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| violation.document_path.clone());

    let mut line = format!("{label} {}", style(path.display()).bold());
    if !violation.field_path.is_empty() {
        line.push_str(&format!(" [{}]", style(&violation.field_path).cyan()));
    }
    line.push_str(&format!(
        " {} {}",
        violation.message,
        style(format!("({})", violation.kind)).dim()
    ));
    line
}
