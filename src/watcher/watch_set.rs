//! The set of repository roots currently registered with the backend.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Absolute repository roots observed for add/unlink events.
///
/// Membership mirrors the most recent `load()`: it is emptied at the start
/// of every load and refilled one eligible repository at a time.
#[derive(Debug, Default)]
pub struct WatchSet {
    roots: HashSet<PathBuf>,
}

impl WatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root. Returns `false` if it was already present.
    pub fn insert(&mut self, root: PathBuf) -> bool {
        self.roots.insert(root)
    }

    pub fn contains(&self, root: &Path) -> bool {
        self.roots.contains(root)
    }

    /// Whether `path` lies under (or is) one of the roots.
    pub fn covers(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| path.starts_with(root))
    }

    /// Remove every root, returning them.
    pub fn drain(&mut self) -> Vec<PathBuf> {
        self.roots.drain().collect()
    }

    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
