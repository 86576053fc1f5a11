//! Typed file events delivered by the watch backend.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};

/// A change observed under a watched path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    /// A file appeared (created, or renamed into place).
    Added(PathBuf),
    /// A file disappeared (deleted, or renamed away).
    Removed(PathBuf),
    /// File contents or metadata changed in place.
    Changed(PathBuf),
}

impl FileEvent {
    pub fn path(&self) -> &Path {
        match self {
            FileEvent::Added(path) | FileEvent::Removed(path) | FileEvent::Changed(path) => path,
        }
    }

    /// Add and remove events are the ones that invalidate the autoload map.
    pub fn alters_file_set(&self) -> bool {
        matches!(self, FileEvent::Added(_) | FileEvent::Removed(_))
    }

    /// Translate a raw notify event into zero or more typed events.
    pub fn from_notify(event: Event) -> Vec<FileEvent> {
        match event.kind {
            EventKind::Create(_) => event.paths.into_iter().map(FileEvent::Added).collect(),
            EventKind::Remove(_) => event.paths.into_iter().map(FileEvent::Removed).collect(),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                event.paths.into_iter().map(FileEvent::Removed).collect()
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                event.paths.into_iter().map(FileEvent::Added).collect()
            }
            // paths = [from, to]
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                let mut paths = event.paths.into_iter();
                let mut events = Vec::with_capacity(2);
                if let Some(from) = paths.next() {
                    events.push(FileEvent::Removed(from));
                }
                if let Some(to) = paths.next() {
                    events.push(FileEvent::Added(to));
                }
                events
            }
            EventKind::Modify(_) => event.paths.into_iter().map(FileEvent::Changed).collect(),
            _ => Vec::new(),
        }
    }
}
