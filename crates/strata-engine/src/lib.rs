//! Strata validation engine.
//!
//! Discovers a project's structure file and `.structure/` tree, validates
//! every document against its schema, checks declared paths, resolves
//! pattern and template inheritance and builds the hook registry. Problems
//! in the project are returned as [`Violation`]s inside a
//! [`ValidationReport`]; nothing here panics or errors on bad input.
//!
//! ```no_run
//! use strata_common_fs::OsFileSystem;
//! use strata_engine::{validate, ValidateOptions};
//!
//! # async fn example() {
//! let report = validate(".", &ValidateOptions::default(), &OsFileSystem::new()).await;
//! println!("{report}");
//! # }
//! ```

pub mod document;
pub mod graph;
pub mod hooks;
pub mod orchestrator;
pub mod paths;
pub mod report;
pub mod schema;
pub mod violation;

use std::path::Path;

pub use document::{Document, DocumentKind, Format, LoadError, Value};
pub use orchestrator::{Orchestrator, RunState};
pub use report::{Outcome, ValidationReport};
pub use strata_common_config::{Settings, StructureConfig, ValidateOptions};
pub use violation::{Severity, Violation, ViolationKind};

use strata_common_fs::FileSystem;

/// Validate the project at `project_root`.
pub async fn validate(
    project_root: impl AsRef<Path>,
    options: &ValidateOptions,
    fs: &dyn FileSystem,
) -> ValidationReport {
    Orchestrator::new(project_root.as_ref(), *options, fs)
        .run()
        .await
}
