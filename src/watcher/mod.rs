//! File watching for linked repositories.
//!
//! # Architecture
//!
//! ```text
//! NotifyBackend (PollWatcher thread)
//!         | FileEvent over mpsc
//!         v
//! WatchService (single task)
//!   - root composer.json changed -> ManifestReconciler::load()
//!   - add/unlink under a WatchSet root -> AutoloadTrigger
//! ```
//!
//! The reconciler only sees the `WatchBackend` trait, so it can be driven
//! without real filesystem timers.

mod backend;
mod debouncer;
mod error;
mod event;
mod service;
mod watch_set;

pub use backend::{NotifyBackend, WatchBackend};
pub use debouncer::Debouncer;
pub use error::WatchError;
pub use event::FileEvent;
pub use service::WatchService;
pub use watch_set::WatchSet;
