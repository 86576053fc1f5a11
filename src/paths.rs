//! Path utilities for resolving repository locations.
//!
//! Resolution is purely lexical: `..` and `.` components are folded without
//! touching the filesystem, so a repository that does not exist yet still
//! resolves to a stable absolute path.

use std::path::{Component, Path, PathBuf};

/// Resolve `path` against `base`.
///
/// - If `path` is relative, it is joined onto `base`
/// - If `path` is already absolute, `base` is ignored
///
/// The result is normalized (`a/b/../c` becomes `a/c`).
pub fn resolve_against(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let joined = if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    };
    normalize(&joined)
}

/// Fold `.` and `..` components lexically.
///
/// A `..` at the root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) && normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}

/// Make `path` absolute relative to the current directory, lexically.
pub fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    Ok(resolve_against(&std::env::current_dir()?, path))
}
