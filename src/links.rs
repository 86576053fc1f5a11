//! Filesystem primitives for vendor link replacement.
//!
//! A vendor entry for a watched dependency is always a directory link
//! (symlink on Unix, directory symlink on Windows). Whatever sits at the
//! link path before is destroyed first, never merged.

use std::fs;
use std::io;
use std::path::Path;

/// Remove whatever exists at `path`.
///
/// - Symlinks are removed themselves, their target is left alone
/// - Directories are removed recursively
/// - A missing path is not an error
pub fn remove_entry(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    let file_type = metadata.file_type();
    if file_type.is_symlink() {
        remove_link(path)
    } else if file_type.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Create a directory link at `link` pointing to `target`.
///
/// Parent directories of `link` are created as needed, since vendor
/// namespaces (`vendor/acme/`) may not exist yet.
pub fn create_dir_link(target: &Path, link: &Path) -> io::Result<()> {
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent)?;
    }
    symlink_dir(target, link)
}

/// Destroy any entry at `link`, then link it to `target`.
pub fn replace_with_link(target: &Path, link: &Path) -> io::Result<()> {
    remove_entry(link)?;
    create_dir_link(target, link)
}

/// Whether `link` is a symlink whose stored target equals `target`.
pub fn is_link_to(link: &Path, target: &Path) -> bool {
    match fs::symlink_metadata(link) {
        Ok(metadata) if metadata.file_type().is_symlink() => {
            fs::read_link(link).map(|stored| stored == target).unwrap_or(false)
        }
        _ => false,
    }
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(unix)]
fn remove_link(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

// Directory symlinks on Windows are removed like directories.
#[cfg(windows)]
fn remove_link(path: &Path) -> io::Result<()> {
    fs::remove_dir(path).or_else(|_| fs::remove_file(path))
}
