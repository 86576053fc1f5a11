//! The watch command: reconcile once, then react to file events.

use std::path::Path;

use anyhow::{Context, anyhow};

use super::Cli;
use crate::autoload::{AutoloadTrigger, ComposerCommand};
use crate::config::Settings;
use crate::logging;
use crate::reconciler::ManifestReconciler;
use crate::watcher::{NotifyBackend, WatchService};

/// Run with the current directory as project root.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let root_dir = std::env::current_dir().context("cannot read the current directory")?;
    run_in(&root_dir, cli).await
}

/// Run with an explicit project root.
pub async fn run_in(root_dir: &Path, cli: Cli) -> anyhow::Result<()> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(root_dir),
    }
    .map_err(|e| anyhow!("configuration error: {e}"))?;

    if cli.debug {
        settings.enable_debug();
    }
    logging::init_with_config(&settings.logging);

    let (backend, events) = NotifyBackend::new(&settings.watch)?;
    let mut reconciler = ManifestReconciler::initialize(root_dir, Box::new(backend))?;
    reconciler.load()?;

    let trigger = AutoloadTrigger::new(
        Box::new(ComposerCommand::from_config(&settings.autoload)),
        reconciler.root_dir().to_path_buf(),
        settings.autoload.success_phrase.clone(),
    );

    WatchService::new(reconciler, trigger, events)
        .with_debounce_ms(settings.watch.debounce_ms)
        .with_manifest_reload(settings.watch.reload_on_manifest_change)
        .run()
        .await?;

    Ok(())
}
