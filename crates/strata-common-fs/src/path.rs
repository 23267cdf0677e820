//! Path manipulation utilities.
//!
//! Everything here is lexical: no function touches the filesystem except
//! [`find_project_root`].

use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving `.` and `..` without hitting the filesystem.
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(p) => components.push(Component::Prefix(p)),
            Component::RootDir => {
                components.clear();
                components.push(Component::RootDir);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(last) = components.last() {
                    match last {
                        Component::Normal(_) => {
                            components.pop();
                        }
                        Component::ParentDir => {
                            components.push(Component::ParentDir);
                        }
                        _ => {} // `/..` is `/`
                    }
                } else {
                    components.push(Component::ParentDir);
                }
            }
            Component::Normal(c) => components.push(Component::Normal(c)),
        }
    }

    if components.is_empty() {
        PathBuf::from(".")
    } else {
        components.iter().collect()
    }
}

/// Make a path relative to a base path.
pub fn relative_to(path: impl AsRef<Path>, base: impl AsRef<Path>) -> Option<PathBuf> {
    let path = normalize(path);
    let base = normalize(base);

    if path.is_absolute() != base.is_absolute() {
        return None;
    }

    let mut path_components = path.components().peekable();
    let mut base_components = base.components().peekable();

    while let (Some(p), Some(b)) = (path_components.peek(), base_components.peek()) {
        if p != b {
            break;
        }
        path_components.next();
        base_components.next();
    }

    let mut result = PathBuf::new();
    for _ in base_components {
        result.push("..");
    }
    for component in path_components {
        result.push(component);
    }

    if result.as_os_str().is_empty() {
        Some(PathBuf::from("."))
    } else {
        Some(result)
    }
}

/// True if `path` lies inside `root` (or is `root`) after normalization.
pub fn is_within(path: impl AsRef<Path>, root: impl AsRef<Path>) -> bool {
    let path = normalize(path);
    let root = normalize(root);
    if root == Path::new(".") {
        return !path.is_absolute() && !starts_with_parent(&path);
    }
    path.starts_with(&root)
}

/// Resolve `declared` against `base` and require the result to stay inside
/// `root`.
///
/// Absolute declarations are taken as-is. Returns the normalized path on
/// success and the offending normalized path on escape.
pub fn resolve_within(
    base: impl AsRef<Path>,
    declared: impl AsRef<Path>,
    root: impl AsRef<Path>,
) -> Result<PathBuf, PathBuf> {
    let declared = declared.as_ref();
    let joined = if declared.is_absolute() {
        declared.to_path_buf()
    } else {
        base.as_ref().join(declared)
    };
    let resolved = normalize(joined);
    if is_within(&resolved, root) {
        Ok(resolved)
    } else {
        Err(resolved)
    }
}

/// True if `path` starts with `prefix`, comparing whole components.
///
/// `src/gen` matches `src/gen` and `src/gen/x.rs` but not `src/generated`.
pub fn has_prefix(path: impl AsRef<Path>, prefix: impl AsRef<Path>) -> bool {
    let prefix = normalize(prefix);
    if prefix == Path::new(".") {
        return true;
    }
    normalize(path).starts_with(prefix)
}

fn starts_with_parent(path: &Path) -> bool {
    matches!(path.components().next(), Some(Component::ParentDir))
}

/// Find the project root by walking up from `start` until a structure file
/// or `.structure` directory is found.
pub fn find_project_root(start: impl AsRef<Path>) -> Option<PathBuf> {
    let markers = [
        "structure.yaml",
        "structure.yml",
        "structure.json",
        ".structure",
    ];

    let mut current = start.as_ref().to_path_buf();

    loop {
        for marker in &markers {
            if current.join(marker).exists() {
                return Some(current);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}
