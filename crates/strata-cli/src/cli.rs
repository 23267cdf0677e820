//! CLI argument definitions using clap derive macros.

use clap::{ArgAction, ColorChoice, Parser, Subcommand};

use crate::commands::{HooksCommand, SchemaCommand, ValidateCommand};
use crate::error::CliError;
use crate::Exit;

/// Strata - validate structure files, patterns, templates and hooks
#[derive(Debug, Parser)]
#[command(
    name = "strata",
    author,
    version,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase verbosity level"
    )]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Suppress non-error output"
    )]
    pub quiet: bool,

    /// When to use colors
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "When to use terminal colors"
    )]
    pub color: ColorChoice,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        value_enum,
        help = "Output format (text, json)"
    )]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate a project's structure file and .structure/ tree
    #[command(visible_alias = "check")]
    Validate(ValidateCommand),

    /// List or run hook scripts
    Hooks(HooksCommand),

    /// Print the schema of a document kind
    Schema(SchemaCommand),
}

/// Context passed to all commands
#[derive(Debug, Clone, Copy)]
pub struct CommandContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl Cli {
    /// Execute the selected command
    pub async fn execute(self) -> Result<Exit, CliError> {
        match self.color {
            ColorChoice::Always => console::set_colors_enabled(true),
            ColorChoice::Never => console::set_colors_enabled(false),
            ColorChoice::Auto => {}
        }

        let ctx = CommandContext {
            format: self.format,
            quiet: self.quiet,
        };

        match self.command {
            Command::Validate(cmd) => cmd.execute(&ctx).await,
            Command::Hooks(cmd) => cmd.execute(&ctx).await,
            Command::Schema(cmd) => cmd.execute(&ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_validate_flags() {
        let cli = Cli::try_parse_from([
            "strata", "-vv", "--format", "json", "validate", "some/dir", "--strict", "--no-hooks",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(cli.command, Command::Validate(_)));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["strata", "-q", "-v", "validate"]).is_err());
    }
}
