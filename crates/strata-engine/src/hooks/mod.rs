//! Hook scripts under `.structure/hooks/`.
//!
//! The registry only describes hooks. Running one goes through a
//! [`ProcessRunner`] supplied by the caller.

mod registry;
mod runner;

pub use registry::{HookDescriptor, HookInvocation, HookRegistry, HookStatus, KNOWN_HOOKS};
pub use runner::{ProcessOutput, ProcessRunner, RunnerError};
