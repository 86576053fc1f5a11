//! The filesystem-watch capability the reconciler depends on.
//!
//! `WatchBackend` is the narrow seam: register a path, drop a path. Events
//! flow out of band through the channel handed back by the backend's
//! constructor, so the reconciler never sees timers or polling.

use std::path::Path;
use std::time::Duration;

use notify::{Event, PollWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::error::WatchError;
use super::event::FileEvent;
use crate::config::WatchConfig;

/// Register and unregister paths with a filesystem watcher.
pub trait WatchBackend: Send {
    /// Start observing `path` recursively.
    fn watch(&mut self, path: &Path) -> Result<(), WatchError>;

    /// Stop observing `path`.
    fn unwatch(&mut self, path: &Path) -> Result<(), WatchError>;
}

/// Polling watcher backed by `notify::PollWatcher`.
///
/// Polling keeps behavior identical across platforms and through symlinked
/// directories. The initial scan of a newly watched path emits no events.
pub struct NotifyBackend {
    watcher: PollWatcher,
}

impl NotifyBackend {
    /// Create the backend and the receiving end of its event stream.
    ///
    /// The stream is unbounded: the poller invokes the handler while holding
    /// its watch table lock, so a blocking send would stall `watch`/`unwatch`
    /// calls made from the event loop.
    pub fn new(
        config: &WatchConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<FileEvent>), WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let notify_config = notify::Config::default()
            .with_poll_interval(Duration::from_millis(config.poll_interval_ms))
            .with_follow_symlinks(config.follow_symlinks);

        let watcher = PollWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for file_event in FileEvent::from_notify(event) {
                        // Receiver gone means the event loop has stopped.
                        if tx.send(file_event).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("[watcher] file watch error: {e}");
                }
            },
            notify_config,
        )?;

        crate::debug_event!(
            "watcher",
            "created",
            "poll every {}ms, follow symlinks: {}",
            config.poll_interval_ms,
            config.follow_symlinks
        );

        Ok((Self { watcher }, rx))
    }
}

impl WatchBackend for NotifyBackend {
    fn watch(&mut self, path: &Path) -> Result<(), WatchError> {
        self.watcher
            .watch(path, RecursiveMode::Recursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        crate::debug_event!("watcher", "watching", "{}", path.display());
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> Result<(), WatchError> {
        self.watcher
            .unwatch(path)
            .map_err(|e| WatchError::PathUnwatchFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        crate::debug_event!("watcher", "unwatched", "{}", path.display());
        Ok(())
    }
}
