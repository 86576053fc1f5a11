//! Manifest reconciliation: vendor links and the watch set.
//!
//! `load()` is the single entry point. Each call:
//! 1. Unregisters every watched repository root
//! 2. Re-reads the root composer.json
//! 3. For every watchable path repository that the root requires, replaces
//!    `vendor/<name>` with a link to the repository and watches its root
//!
//! Nothing is cached between calls and nothing is rolled back on failure:
//! links created before a failing declaration stay in place.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{ReconcileError, ReconcileResult};
use crate::links;
use crate::manifest::{MANIFEST_FILE, Manifest, RepositoryDeclaration, VENDOR_DIR};
use crate::paths;
use crate::watcher::{WatchBackend, WatchSet};

/// Why a repository declaration produced no link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// `type` is not `"path"`.
    NotPathRepository,
    /// `options.watch` is not `true`.
    NotWatched,
    /// The repository's package is not a key of the root `require`.
    NotRequired { name: Option<String> },
}

/// What `load()` did with one repository declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationOutcome {
    Linked {
        name: String,
        link: PathBuf,
        target: PathBuf,
    },
    Skipped {
        url: String,
        reason: SkipReason,
    },
}

/// Per-declaration outcomes of one `load()`, in manifest order.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub outcomes: Vec<DeclarationOutcome>,
}

impl LoadReport {
    /// `(name, target)` for every link created, in creation order.
    pub fn linked(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            DeclarationOutcome::Linked { name, target, .. } => Some((name.as_str(), target.as_path())),
            DeclarationOutcome::Skipped { .. } => None,
        })
    }

    pub fn linked_count(&self) -> usize {
        self.linked().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.linked_count()
    }
}

/// Owns the root manifest location, the vendor directory and the live
/// watch set.
pub struct ManifestReconciler {
    root_dir: PathBuf,
    manifest_path: PathBuf,
    vendor_dir: PathBuf,
    watch_set: WatchSet,
    backend: Box<dyn WatchBackend>,
    manifest_watched: bool,
}

impl ManifestReconciler {
    /// Bind to the project in `root_dir`.
    ///
    /// Fails with `ConfigurationNotFound` unless `<root_dir>/composer.json`
    /// exists. The backend is taken as constructed; nothing is watched
    /// until `load()`.
    pub fn initialize(
        root_dir: impl AsRef<Path>,
        backend: Box<dyn WatchBackend>,
    ) -> ReconcileResult<Self> {
        let root_dir = root_dir.as_ref();
        let root_dir =
            paths::absolutize(root_dir).map_err(|_| ReconcileError::ConfigurationNotFound {
                path: root_dir.join(MANIFEST_FILE),
            })?;

        let manifest_path = root_dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(ReconcileError::ConfigurationNotFound {
                path: manifest_path,
            });
        }

        crate::debug_event!("reconciler", "manifest", "{}", manifest_path.display());

        Ok(Self {
            vendor_dir: root_dir.join(VENDOR_DIR),
            root_dir,
            manifest_path,
            watch_set: WatchSet::new(),
            backend,
            manifest_watched: false,
        })
    }

    /// Recompute vendor links and watch membership from scratch.
    ///
    /// Callers must not run two loads concurrently; `&mut self` enforces it.
    pub fn load(&mut self) -> ReconcileResult<LoadReport> {
        self.clear_watches();

        let manifest = Manifest::load(&self.manifest_path)?;
        let mut report = LoadReport::default();
        let mut linked_from: HashMap<String, PathBuf> = HashMap::new();

        for declaration in &manifest.repositories {
            let outcome = self.reconcile_declaration(&manifest, declaration)?;

            if let DeclarationOutcome::Linked { name, target, .. } = &outcome {
                if let Some(previous) = linked_from.insert(name.clone(), target.clone()) {
                    tracing::warn!(
                        "[reconciler] {name} is provided by several watched repositories; {} replaces {}",
                        target.display(),
                        previous.display()
                    );
                }
            }

            report.outcomes.push(outcome);
        }

        crate::log_event!(
            "reconciler",
            "loaded",
            "{} linked, {} skipped, {} watched",
            report.linked_count(),
            report.skipped_count(),
            self.watch_set.len()
        );

        Ok(report)
    }

    /// Register the root manifest itself with the backend so edits to it
    /// can trigger a reload. Not part of the watch set.
    pub fn watch_manifest(&mut self) -> ReconcileResult<()> {
        if !self.manifest_watched {
            self.backend.watch(&self.manifest_path)?;
            self.manifest_watched = true;
        }
        Ok(())
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn vendor_dir(&self) -> &Path {
        &self.vendor_dir
    }

    pub fn watch_set(&self) -> &WatchSet {
        &self.watch_set
    }

    /// Empty the watch set, unregistering each root from the backend.
    fn clear_watches(&mut self) {
        for root in self.watch_set.drain() {
            if let Err(e) = self.backend.unwatch(&root) {
                // The root is gone from the set either way.
                tracing::warn!("[reconciler] {e}");
            }
        }
    }

    fn reconcile_declaration(
        &mut self,
        root: &Manifest,
        declaration: &RepositoryDeclaration,
    ) -> ReconcileResult<DeclarationOutcome> {
        let skipped = |reason| DeclarationOutcome::Skipped {
            url: declaration.url.clone(),
            reason,
        };

        if !declaration.is_path() {
            return Ok(skipped(SkipReason::NotPathRepository));
        }
        if !declaration.is_watched() {
            return Ok(skipped(SkipReason::NotWatched));
        }

        let repository = paths::resolve_against(&self.root_dir, &declaration.url);
        let repository_manifest = repository.join(MANIFEST_FILE);
        if !repository_manifest.is_file() {
            return Err(ReconcileError::DependencyManifestNotFound { repository });
        }

        let dependency = Manifest::load(&repository_manifest)?;
        let name = match dependency.name {
            Some(name) if root.requires(&name) => name,
            name => {
                crate::debug_event!(
                    "reconciler",
                    "not required",
                    "{}",
                    repository.display()
                );
                return Ok(skipped(SkipReason::NotRequired { name }));
            }
        };

        crate::debug_event!("reconciler", "preparing require", "{name}");

        let link = self.vendor_dir.join(&name);
        links::replace_with_link(&repository, &link).map_err(|source| {
            ReconcileError::LinkReplacement {
                path: link.clone(),
                source,
            }
        })?;

        if self.watch_set.insert(repository.clone()) {
            self.backend.watch(&repository)?;
        }

        crate::log_event!(
            "reconciler",
            "linked",
            "{} -> {}",
            link.display(),
            repository.display()
        );

        Ok(DeclarationOutcome::Linked {
            name,
            link,
            target: repository,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::testing::{BackendCall, RecordingBackend};
    use std::fs;
    use tempfile::TempDir;

    /// Workspace layout: `<tmp>/app` is the root, siblings are repositories.
    struct Workspace {
        _temp_dir: TempDir,
        base: PathBuf,
    }

    impl Workspace {
        fn new(root_manifest: &str) -> Self {
            let temp_dir = TempDir::new().unwrap();
            // Resolve /tmp -> /private/tmp style links up front.
            let base = temp_dir.path().canonicalize().unwrap();
            fs::create_dir_all(base.join("app")).unwrap();
            fs::write(base.join("app").join(MANIFEST_FILE), root_manifest).unwrap();
            Self {
                _temp_dir: temp_dir,
                base,
            }
        }

        fn root(&self) -> PathBuf {
            self.base.join("app")
        }

        fn repository(&self, dir: &str, manifest: Option<&str>) -> PathBuf {
            let path = self.base.join(dir);
            fs::create_dir_all(path.join("src")).unwrap();
            if let Some(manifest) = manifest {
                fs::write(path.join(MANIFEST_FILE), manifest).unwrap();
            }
            path
        }

        fn reconciler(&self) -> (ManifestReconciler, RecordingBackend) {
            let backend = RecordingBackend::new();
            let reconciler =
                ManifestReconciler::initialize(self.root(), Box::new(backend.clone())).unwrap();
            (reconciler, backend)
        }
    }

    const SCENARIO: &str = r#"{
        "require": { "acme/lib": "*" },
        "repositories": [
            { "type": "path", "url": "../acme-lib", "options": { "watch": true } }
        ]
    }"#;

    #[test]
    fn test_initialize_requires_root_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let result =
            ManifestReconciler::initialize(temp_dir.path(), Box::new(RecordingBackend::new()));

        match result {
            Err(ReconcileError::ConfigurationNotFound { path }) => {
                assert!(path.ends_with(MANIFEST_FILE));
            }
            _ => panic!("expected ConfigurationNotFound"),
        }
    }

    #[test]
    fn test_initialize_does_not_watch_anything() {
        let workspace = Workspace::new(SCENARIO);
        let (reconciler, backend) = workspace.reconciler();

        assert_eq!(reconciler.vendor_dir(), workspace.root().join("vendor"));
        assert!(reconciler.watch_set().is_empty());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_load_links_and_watches_required_repository() {
        let workspace = Workspace::new(SCENARIO);
        let repo = workspace.repository("acme-lib", Some(r#"{ "name": "acme/lib" }"#));
        let (mut reconciler, backend) = workspace.reconciler();

        let report = reconciler.load().unwrap();

        let link = workspace.root().join("vendor/acme/lib");
        assert!(links::is_link_to(&link, &repo));
        assert!(reconciler.watch_set().contains(&repo));
        assert!(backend.watched().contains(&repo));
        assert_eq!(report.linked().collect::<Vec<_>>(), vec![("acme/lib", repo.as_path())]);
    }

    #[test]
    fn test_reload_clears_watches_before_repopulating() {
        let workspace = Workspace::new(SCENARIO);
        let repo = workspace.repository("acme-lib", Some(r#"{ "name": "acme/lib" }"#));
        let (mut reconciler, backend) = workspace.reconciler();

        reconciler.load().unwrap();
        reconciler.load().unwrap();

        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::Watch(repo.clone()),
                BackendCall::Unwatch(repo.clone()),
                BackendCall::Watch(repo.clone()),
            ]
        );
        assert_eq!(reconciler.watch_set().len(), 1);
    }

    #[test]
    fn test_reload_drops_repository_no_longer_required() {
        let workspace = Workspace::new(SCENARIO);
        let repo = workspace.repository("acme-lib", Some(r#"{ "name": "acme/lib" }"#));
        let (mut reconciler, backend) = workspace.reconciler();
        reconciler.load().unwrap();

        fs::write(
            reconciler.manifest_path(),
            r#"{ "require": {}, "repositories": [
                { "type": "path", "url": "../acme-lib", "options": { "watch": true } }
            ] }"#,
        )
        .unwrap();
        reconciler.load().unwrap();

        assert!(reconciler.watch_set().is_empty());
        assert!(!backend.watched().contains(&repo));
    }

    #[test]
    fn test_skip_reasons_are_reported_in_order() {
        let workspace = Workspace::new(
            r#"{
                "require": { "acme/lib": "*" },
                "repositories": [
                    { "type": "vcs", "url": "https://example.com/acme.git" },
                    { "type": "path", "url": "../unwatched" },
                    { "type": "path", "url": "../other", "options": { "watch": true } }
                ]
            }"#,
        );
        workspace.repository("unwatched", None);
        workspace.repository("other", Some(r#"{ "name": "acme/other" }"#));
        let (mut reconciler, backend) = workspace.reconciler();

        let report = reconciler.load().unwrap();

        let reasons: Vec<SkipReason> = report
            .outcomes
            .iter()
            .map(|outcome| match outcome {
                DeclarationOutcome::Skipped { reason, .. } => reason.clone(),
                DeclarationOutcome::Linked { .. } => panic!("nothing should be linked"),
            })
            .collect();
        assert_eq!(
            reasons,
            vec![
                SkipReason::NotPathRepository,
                SkipReason::NotWatched,
                SkipReason::NotRequired {
                    name: Some("acme/other".to_string())
                },
            ]
        );
        assert!(backend.calls().is_empty());
        assert!(!workspace.root().join("vendor").exists());
    }

    #[test]
    fn test_dependency_without_name_is_not_required() {
        let workspace = Workspace::new(SCENARIO);
        workspace.repository("acme-lib", Some(r#"{ "description": "no name" }"#));
        let (mut reconciler, _backend) = workspace.reconciler();

        let report = reconciler.load().unwrap();

        assert_eq!(report.linked_count(), 0);
        assert_eq!(
            report.outcomes[0],
            DeclarationOutcome::Skipped {
                url: "../acme-lib".to_string(),
                reason: SkipReason::NotRequired { name: None },
            }
        );
    }

    #[test]
    fn test_invalid_dependency_manifest_aborts_load() {
        let workspace = Workspace::new(SCENARIO);
        workspace.repository("acme-lib", Some("{ broken"));
        let (mut reconciler, _backend) = workspace.reconciler();

        let err = reconciler.load().unwrap_err();
        assert!(matches!(err, ReconcileError::ManifestParse { .. }));
    }

    #[test]
    fn test_duplicate_names_last_declaration_wins() {
        let workspace = Workspace::new(
            r#"{
                "require": { "acme/lib": "*" },
                "repositories": [
                    { "type": "path", "url": "../first", "options": { "watch": true } },
                    { "type": "path", "url": "../second", "options": { "watch": true } }
                ]
            }"#,
        );
        let first = workspace.repository("first", Some(r#"{ "name": "acme/lib" }"#));
        let second = workspace.repository("second", Some(r#"{ "name": "acme/lib" }"#));
        let (mut reconciler, _backend) = workspace.reconciler();

        let report = reconciler.load().unwrap();

        let link = workspace.root().join("vendor/acme/lib");
        assert!(links::is_link_to(&link, &second));
        assert_eq!(report.linked_count(), 2);
        // Both roots stay watched; only the vendor entry is last-write-wins.
        assert!(reconciler.watch_set().contains(&first));
        assert!(reconciler.watch_set().contains(&second));
    }

    #[test]
    fn test_watch_manifest_registers_once() {
        let workspace = Workspace::new(SCENARIO);
        let (mut reconciler, backend) = workspace.reconciler();

        reconciler.watch_manifest().unwrap();
        reconciler.watch_manifest().unwrap();

        assert_eq!(
            backend.calls(),
            vec![BackendCall::Watch(reconciler.manifest_path().to_path_buf())]
        );
        assert!(reconciler.watch_set().is_empty());
    }
}
