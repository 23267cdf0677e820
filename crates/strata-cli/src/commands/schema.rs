//! Schema command implementation.

use clap::{Args, ValueEnum};
use console::style;
use serde::Serialize;
use strata_engine::schema::{schema_for, FieldRow};
use strata_engine::DocumentKind;

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{print_output, FormattedOutput};
use crate::Exit;

/// Print the fields accepted by a document kind
#[derive(Debug, Args)]
pub struct SchemaCommand {
    /// Document kind to describe
    #[arg(value_enum)]
    kind: KindArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    RootStructure,
    Pattern,
    Template,
    Config,
}

impl From<KindArg> for DocumentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::RootStructure => DocumentKind::RootStructure,
            KindArg::Pattern => DocumentKind::Pattern,
            KindArg::Template => DocumentKind::Template,
            KindArg::Config => DocumentKind::Config,
        }
    }
}

#[derive(Debug, Serialize)]
struct SchemaOutput {
    kind: String,
    fields: Vec<FieldRow>,
}

impl FormattedOutput for SchemaOutput {
    fn format_text(&self) -> String {
        let width = self.fields.iter().map(|r| r.path.len()).max().unwrap_or(0);
        let mut out = format!("{}\n", style(&self.kind).bold());
        for row in &self.fields {
            let required = if row.required {
                style("required").red().to_string()
            } else {
                style("optional").dim().to_string()
            };
            out.push_str(&format!(
                "  {:<width$}  {:<16} {}",
                row.path,
                row.ty,
                required,
                width = width
            ));
            if !row.constraints.is_empty() {
                out.push_str(&format!("  {}", style(row.constraints.join(", ")).cyan()));
            }
            out.push('\n');
        }
        out.truncate(out.trim_end().len());
        out
    }

    fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl SchemaCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<Exit, CliError> {
        let kind = DocumentKind::from(self.kind);
        let output = SchemaOutput {
            kind: kind.to_string(),
            fields: schema_for(kind).rows(),
        };
        print_output(ctx, &output)?;
        Ok(Exit::Passed)
    }
}
