//! Filesystem access for Strata.
//!
//! The validation engine never touches `std::fs` directly. It goes through the
//! [`FileSystem`] trait so that every component can run against an in-memory
//! tree in tests ([`MemoryFileSystem`]) or the real disk ([`OsFileSystem`]).

pub mod path;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use strata_common_core::{Error, Result};

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Full path of the entry.
    pub path: PathBuf,
    /// Final path component.
    pub name: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Whether any execute bit is set (always `true` for files on non-unix).
    pub executable: bool,
    /// The entry itself is a symbolic link. `kind` and `executable` describe its target.
    pub symlink: bool,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// File name without its final extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }

    /// Final extension, lowercased.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

/// Read-only filesystem collaborator.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// List a directory. Entries are sorted by name.
    async fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// Read a whole file.
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>>;

    /// True if anything exists at `path`.
    async fn exists(&self, path: &Path) -> bool;

    /// True if `path` is a directory.
    async fn is_dir(&self, path: &Path) -> bool;
}

/// [`FileSystem`] backed by the real disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl OsFileSystem {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}

#[async_trait]
impl FileSystem for OsFileSystem {
    async fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(path)
            .await
            .map_err(|e| Error::io("failed to list directory", path, e))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| Error::io("failed to list directory", path, e))?
        {
            let entry_path = entry.path();
            let symlink = entry
                .file_type()
                .await
                .map(|t| t.is_symlink())
                .unwrap_or(false);
            // Follows symlinks so a linked hook script reports its target's mode.
            let metadata = match tokio::fs::metadata(&entry_path).await {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!(
                        path = %entry_path.display(),
                        error = %e,
                        "skipping unreadable entry"
                    );
                    continue;
                }
            };
            let kind = if metadata.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry_path,
                kind,
                executable: kind == EntryKind::File && is_executable(&metadata),
                symlink,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| Error::io("failed to read file", path, e))
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn is_dir(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
enum MemoryNode {
    File { content: Vec<u8>, executable: bool },
    Directory,
}

/// In-memory [`FileSystem`] for tests and embedding.
///
/// Paths are normalized on insert; adding a file creates its parent
/// directories.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    nodes: BTreeMap<PathBuf, MemoryNode>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a regular, non-executable file.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) -> &mut Self {
        self.insert_file(path.as_ref(), content.into(), false)
    }

    /// Add a file with its execute bit set.
    pub fn add_executable(
        &mut self,
        path: impl AsRef<Path>,
        content: impl Into<Vec<u8>>,
    ) -> &mut Self {
        self.insert_file(path.as_ref(), content.into(), true)
    }

    /// Add a directory (and its parents).
    pub fn add_dir(&mut self, path: impl AsRef<Path>) -> &mut Self {
        let path = path::normalize(path);
        self.add_parents(&path);
        self.nodes.insert(path, MemoryNode::Directory);
        self
    }

    /// Builder form of [`add_file`](Self::add_file).
    pub fn with_file(mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) -> Self {
        self.add_file(path, content);
        self
    }

    /// Builder form of [`add_executable`](Self::add_executable).
    pub fn with_executable(mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) -> Self {
        self.add_executable(path, content);
        self
    }

    /// Builder form of [`add_dir`](Self::add_dir).
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.add_dir(path);
        self
    }

    fn insert_file(&mut self, path: &Path, content: Vec<u8>, executable: bool) -> &mut Self {
        let path = path::normalize(path);
        self.add_parents(&path);
        self.nodes
            .insert(path, MemoryNode::File { content, executable });
        self
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(dir) = parent {
            if dir.as_os_str().is_empty() {
                break;
            }
            self.nodes
                .entry(dir.to_path_buf())
                .or_insert(MemoryNode::Directory);
            parent = dir.parent();
        }
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn list_directory(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let dir = path::normalize(dir);
        match self.nodes.get(&dir) {
            Some(MemoryNode::Directory) => {}
            Some(MemoryNode::File { .. }) => {
                return Err(Error::FileSystem {
                    message: "not a directory".to_string(),
                    path: dir,
                    source: None,
                })
            }
            None => return Err(Error::NotFound(dir)),
        }

        // BTreeMap iteration keeps the listing sorted by path, hence by name.
        let entries = self
            .nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(dir.as_path()))
            .map(|(p, node)| {
                let (kind, executable) = match node {
                    MemoryNode::File { executable, .. } => (EntryKind::File, *executable),
                    MemoryNode::Directory => (EntryKind::Directory, false),
                };
                DirEntry {
                    name: p
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    path: p.clone(),
                    kind,
                    executable,
                    symlink: false,
                }
            })
            .collect();
        Ok(entries)
    }

    async fn read_file(&self, file: &Path) -> Result<Vec<u8>> {
        let file = path::normalize(file);
        match self.nodes.get(&file) {
            Some(MemoryNode::File { content, .. }) => Ok(content.clone()),
            Some(MemoryNode::Directory) => Err(Error::FileSystem {
                message: "is a directory".to_string(),
                path: file,
                source: None,
            }),
            None => Err(Error::NotFound(file)),
        }
    }

    async fn exists(&self, path: &Path) -> bool {
        self.nodes.contains_key(&path::normalize(path))
    }

    async fn is_dir(&self, path: &Path) -> bool {
        matches!(
            self.nodes.get(&path::normalize(path)),
            Some(MemoryNode::Directory)
        )
    }
}
