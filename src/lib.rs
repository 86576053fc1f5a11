//! Keep Composer path repositories linked into `vendor/` and regenerate the
//! autoloader when files in them are added or removed.

pub mod autoload;
pub mod cli;
pub mod config;
pub mod error;
pub mod links;
pub mod logging;
pub mod manifest;
pub mod paths;
pub mod reconciler;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use autoload::{AutoloadOutcome, AutoloadRunner, AutoloadTrigger, CommandOutput, ComposerCommand};
pub use config::Settings;
pub use error::{ReconcileError, ReconcileResult};
pub use manifest::{Manifest, RepositoryDeclaration};
pub use reconciler::{DeclarationOutcome, LoadReport, ManifestReconciler, SkipReason};
pub use watcher::{FileEvent, NotifyBackend, WatchBackend, WatchError, WatchService, WatchSet};
