//! Configuration types for Strata.
//!
//! This crate provides the typed view of `.structure/config.yaml` and the
//! run options callers pass to the validation engine.

pub mod loader;
pub mod options;
pub mod types;

pub use loader::*;
pub use options::*;
pub use types::*;
