//! Error types for manifest reconciliation.

use std::path::PathBuf;
use thiserror::Error;

use crate::watcher::WatchError;

/// Errors raised while initializing the reconciler or running `load()`.
///
/// None of these are retried. A failure during `load()` leaves links and
/// watches created before the failing declaration in place.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("composer.json file doesn't exist at {path}")]
    ConfigurationNotFound { path: PathBuf },

    #[error("Failed to parse manifest {path}: {reason}")]
    ManifestParse { path: PathBuf, reason: String },

    #[error("composer.json file not found for local repository \"{repository}\"")]
    DependencyManifestNotFound { repository: PathBuf },

    #[error("Failed to replace vendor link at {path}: {source}")]
    LinkReplacement {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Watch(#[from] WatchError),
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_manifest_message_names_repository() {
        let err = ReconcileError::DependencyManifestNotFound {
            repository: PathBuf::from("/work/acme-lib"),
        };
        let message = err.to_string();
        assert!(message.contains("/work/acme-lib"));
        assert!(message.contains("composer.json"));
    }

    #[test]
    fn test_link_replacement_keeps_source() {
        use std::error::Error as _;

        let err = ReconcileError::LinkReplacement {
            path: PathBuf::from("/work/vendor/acme/lib"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
    }
}
