//! Burst coalescing for add/unlink events.
//!
//! A `git checkout` or a code generator can add hundreds of files inside one
//! poll interval. With a non-zero quiet period those events collapse into a
//! single autoload run once no new event has arrived for the period.

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Collects changed paths until the watched trees have been quiet long enough.
#[derive(Debug)]
pub struct Debouncer {
    /// Paths changed since the last flush, in arrival order.
    pending: Vec<PathBuf>,
    /// Time of the most recent recorded event.
    last_event: Option<Instant>,
    /// Quiet period required before the batch is released.
    quiet: Duration,
}

impl Debouncer {
    /// Create a debouncer with the given quiet period in milliseconds.
    ///
    /// A zero period disables coalescing; callers dispatch events directly.
    pub fn new(quiet_ms: u64) -> Self {
        Self {
            pending: Vec::new(),
            last_event: None,
            quiet: Duration::from_millis(quiet_ms),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.quiet.is_zero()
    }

    /// Record a changed path and restart the quiet period.
    pub fn record(&mut self, path: PathBuf) {
        self.record_at(path, Instant::now());
    }

    fn record_at(&mut self, path: PathBuf, at: Instant) {
        if !self.pending.contains(&path) {
            self.pending.push(path);
        }
        self.last_event = Some(at);
    }

    /// Release the batch if the quiet period has elapsed.
    pub fn take_ready(&mut self) -> Option<Vec<PathBuf>> {
        self.take_ready_at(Instant::now())
    }

    fn take_ready_at(&mut self, now: Instant) -> Option<Vec<PathBuf>> {
        let last = self.last_event?;
        if now.duration_since(last) < self.quiet {
            return None;
        }
        self.flush()
    }

    /// Release the batch regardless of timing.
    pub fn flush(&mut self) -> Option<Vec<PathBuf>> {
        self.last_event = None;
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
