//! Validate command implementation.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use strata_common_config::{ReportFormat, ValidateOptions};
use strata_common_fs::OsFileSystem;
use strata_engine::Outcome;
use tracing::info;

use super::project_root;
use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::print_output;
use crate::Exit;

/// Validate a project's structure files
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Project directory (defaults to the nearest directory holding a structure file)
    path: Option<PathBuf>,

    /// Report unknown fields as errors instead of warnings
    #[arg(long, env = "STRATA_STRICT_MODE")]
    strict: bool,

    /// Require every declared path to exist
    #[arg(long, env = "STRATA_VALIDATE_PATHS")]
    validate_paths: bool,

    /// Skip hook discovery
    #[arg(long)]
    no_hooks: bool,

    /// Also write the report to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Serialization used for --output
    #[arg(long, value_enum, default_value = "json")]
    output_format: ReportFileFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFileFormat {
    Json,
    Yaml,
}

impl From<ReportFileFormat> for ReportFormat {
    fn from(format: ReportFileFormat) -> Self {
        match format {
            ReportFileFormat::Json => ReportFormat::Json,
            ReportFileFormat::Yaml => ReportFormat::Yaml,
        }
    }
}

impl ValidateCommand {
    fn options(&self) -> ValidateOptions {
        ValidateOptions {
            strict_mode: self.strict,
            validate_paths: self.validate_paths,
            hooks_enabled: !self.no_hooks,
        }
    }

    pub async fn execute(&self, ctx: &CommandContext) -> Result<Exit, CliError> {
        let root = project_root(self.path.as_deref()).await?;
        info!(root = %root.display(), "validating project");

        let fs = OsFileSystem::new();
        let report = strata_common_log::timed!(
            "validate",
            strata_engine::validate(&root, &self.options(), &fs).await
        );

        if let Some(output) = &self.output {
            report.write_to(output, self.output_format.into()).await?;
        }

        if !(ctx.quiet && report.passed) {
            print_output(ctx, &report)?;
        }

        Ok(match report.outcome {
            Outcome::Passed => Exit::Passed,
            Outcome::Failed => Exit::Failed,
            Outcome::Aborted => Exit::Aborted,
        })
    }
}
