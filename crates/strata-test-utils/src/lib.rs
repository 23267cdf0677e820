//! Test utilities for Strata crates.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Creates a temporary directory that is cleaned up on drop.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// A throwaway project tree on disk.
///
/// ```
/// let project = strata_test_utils::ProjectFixture::new()
///     .file("structure.yaml", "version: 1.0.0\nproject-name: demo\n")
///     .dir("src");
/// assert!(project.path().join("src").is_dir());
/// ```
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    pub fn new() -> Self {
        Self { dir: temp_dir() }
    }

    /// The project root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `relative` inside the project.
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write a file, creating parent directories.
    pub fn file(self, relative: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Self {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&path, content).expect("Failed to write fixture file");
        self
    }

    /// Write a file with mode 0755.
    pub fn executable(self, relative: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Self {
        let path = self.join(relative.as_ref());
        let fixture = self.file(relative, content);
        set_mode(&path, 0o755);
        fixture
    }

    /// Write a file with mode 0644.
    pub fn plain(self, relative: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Self {
        let path = self.join(relative.as_ref());
        let fixture = self.file(relative, content);
        set_mode(&path, 0o644);
        fixture
    }

    pub fn dir(self, relative: impl AsRef<Path>) -> Self {
        std::fs::create_dir_all(self.join(relative)).expect("Failed to create fixture dir");
        self
    }

    /// A minimal valid root structure file.
    pub fn minimal(self) -> Self {
        self.file("structure.yaml", "version: 1.0.0\nproject-name: fixture\n")
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .expect("Failed to set permissions");
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) {}

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a Result is Err.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(_) => {}
        }
    };
}
