//! Common test utilities for CLI testing.

use std::path::Path;

use assert_cmd::Command;
use strata_test_utils::ProjectFixture;

/// A project on disk plus a `strata` command rooted in it.
pub struct TestContext {
    pub project: ProjectFixture,
}

impl TestContext {
    pub fn new(project: ProjectFixture) -> Self {
        Self { project }
    }

    /// Project with only a minimal valid structure file.
    pub fn minimal() -> Self {
        Self::new(ProjectFixture::new().minimal())
    }

    pub fn path(&self) -> &Path {
        self.project.path()
    }

    /// Create a command configured for this context
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("strata").expect("Binary not found");
        cmd.current_dir(self.path())
            .env_remove("STRATA_STRICT_MODE")
            .env_remove("STRATA_VALIDATE_PATHS")
            .env("NO_COLOR", "1");
        cmd
    }
}
