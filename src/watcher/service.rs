//! Single-task event loop routing file events.
//!
//! Events are handled one at a time; a handler (autoload run or manifest
//! reload) finishes before the next event is taken from the channel.

use std::future::Future;
use std::path::Path;

use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};

use super::debouncer::Debouncer;
use super::event::FileEvent;
use crate::autoload::AutoloadTrigger;
use crate::error::ReconcileResult;
use crate::reconciler::ManifestReconciler;

/// How often pending coalesced events are checked.
const DEBOUNCE_TICK_MS: u64 = 100;

/// Owns the reconciler and the autoload trigger and drives both from the
/// backend's event stream.
pub struct WatchService {
    reconciler: ManifestReconciler,
    trigger: AutoloadTrigger,
    event_rx: mpsc::UnboundedReceiver<FileEvent>,
    debouncer: Debouncer,
    reload_on_manifest_change: bool,
}

impl WatchService {
    pub fn new(
        reconciler: ManifestReconciler,
        trigger: AutoloadTrigger,
        event_rx: mpsc::UnboundedReceiver<FileEvent>,
    ) -> Self {
        Self {
            reconciler,
            trigger,
            event_rx,
            debouncer: Debouncer::new(0),
            reload_on_manifest_change: true,
        }
    }

    /// Coalesce add/unlink bursts into one autoload run after `ms` of quiet.
    /// Zero runs the command for every event.
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debouncer = Debouncer::new(ms);
        self
    }

    /// Reload links and watches when the root composer.json changes.
    pub fn with_manifest_reload(mut self, enabled: bool) -> Self {
        self.reload_on_manifest_change = enabled;
        self
    }

    pub fn reconciler(&self) -> &ManifestReconciler {
        &self.reconciler
    }

    /// Run until the event stream closes or Ctrl-C is received.
    pub async fn run(self) -> ReconcileResult<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("[watcher] failed to listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until the event stream closes or `shutdown` completes.
    ///
    /// Coalesced events still pending are flushed in both cases.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> ReconcileResult<()> {
        if self.reload_on_manifest_change {
            self.reconciler.watch_manifest()?;
        }

        let watch_set = self.reconciler.watch_set();
        if watch_set.is_empty() {
            tracing::warn!(
                "[watcher] no repositories to watch - mark path repositories with \"options\": {{\"watch\": true}}"
            );
        }
        for root in watch_set.roots() {
            crate::debug_event!("watcher", "observing", "{}", root.display());
        }
        crate::log_event!("watcher", "started", "{} repositories", watch_set.len());

        tokio::pin!(shutdown);

        loop {
            let tick = sleep(Duration::from_millis(DEBOUNCE_TICK_MS));
            tokio::pin!(tick);

            tokio::select! {
                received = self.event_rx.recv() => {
                    match received {
                        Some(event) => self.handle_event(event).await,
                        None => {
                            self.flush_pending().await;
                            crate::log_event!("watcher", "event stream closed");
                            return Ok(());
                        }
                    }
                }

                _ = &mut tick, if self.debouncer.has_pending() => {
                    if let Some(batch) = self.debouncer.take_ready() {
                        self.trigger.on_batch(&batch).await;
                    }
                }

                _ = &mut shutdown => {
                    self.flush_pending().await;
                    crate::log_event!("watcher", "stopped");
                    return Ok(());
                }
            }
        }
    }

    /// Route one event.
    pub async fn handle_event(&mut self, event: FileEvent) {
        if self.is_manifest_event(event.path()) {
            self.handle_manifest_event(&event);
            return;
        }

        if !event.alters_file_set() {
            crate::debug_event!("watcher", "ignored change", "{}", event.path().display());
            return;
        }

        if !self.reconciler.watch_set().covers(event.path()) {
            crate::debug_event!("watcher", "unmatched", "{}", event.path().display());
            return;
        }

        if self.debouncer.is_enabled() {
            self.debouncer.record(event.path().to_path_buf());
        } else {
            self.trigger.on_file_event(event.path()).await;
        }
    }

    fn is_manifest_event(&self, path: &Path) -> bool {
        self.reload_on_manifest_change && path == self.reconciler.manifest_path()
    }

    fn handle_manifest_event(&mut self, event: &FileEvent) {
        if let FileEvent::Removed(path) = event {
            tracing::warn!(
                "[watcher] {} was removed, keeping current links",
                path.display()
            );
            return;
        }

        crate::log_event!("watcher", "manifest changed, reloading");

        // A broken manifest while editing is expected; keep running.
        if let Err(e) = self.reconciler.load() {
            tracing::error!("[reconciler] reload failed: {e}");
        }
    }

    async fn flush_pending(&mut self) {
        if let Some(batch) = self.debouncer.flush() {
            self.trigger.on_batch(&batch).await;
        }
    }
}
