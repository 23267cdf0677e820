//! Command implementations.

mod hooks;
mod schema;
mod validate;

use std::path::{Path, PathBuf};

pub use hooks::HooksCommand;
pub use schema::SchemaCommand;
pub use validate::ValidateCommand;

use crate::error::CliError;

/// Resolve the project root: an explicit path wins, otherwise search upward
/// from the current directory for a structure file.
pub(crate) async fn project_root(explicit: Option<&Path>) -> Result<PathBuf, CliError> {
    let start = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let cwd = std::env::current_dir()
                .map_err(|e| CliError::io_with_path("cannot read current directory", e, "."))?;
            strata_common_fs::path::find_project_root(&cwd).unwrap_or(cwd)
        }
    };

    tokio::fs::canonicalize(&start).await.map_err(|e| {
        CliError::io_with_path(
            format!("cannot open project directory {}", start.display()),
            e,
            start.clone(),
        )
    })
}
