//! Autoload regeneration triggered by file add/unlink events.
//!
//! The external command is reached only through [`AutoloadRunner`], so the
//! trigger can be exercised with a test double. Failures never escape:
//! they are classified, logged and returned as an [`AutoloadOutcome`].

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;

use crate::config::AutoloadConfig;

/// Text output and exit status of one autoload command run.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Combined stdout and stderr.
    pub output: String,
    /// Exit code, `None` when terminated by a signal.
    pub status: Option<i32>,
}

/// Runs the dependency manager's autoload-regeneration command.
#[async_trait]
pub trait AutoloadRunner: Send + Sync {
    /// Run to completion with `cwd` as working directory.
    async fn run(&self, cwd: &Path) -> io::Result<CommandOutput>;
}

/// Runs `composer dump-autoload` (or the configured equivalent).
#[derive(Debug, Clone)]
pub struct ComposerCommand {
    program: String,
    args: Vec<String>,
}

impl ComposerCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &AutoloadConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    // Composer ships as a .bat shim on Windows, which needs the shell.
    #[cfg(windows)]
    fn command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new("cmd");
        command.arg("/C").arg(&self.program).args(&self.args);
        command
    }

    #[cfg(not(windows))]
    fn command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

#[async_trait]
impl AutoloadRunner for ComposerCommand {
    async fn run(&self, cwd: &Path) -> io::Result<CommandOutput> {
        let output = self
            .command()
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()
            .await?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(CommandOutput {
            output: text,
            status: output.status.code(),
        })
    }
}

/// Result of one regeneration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoloadOutcome {
    Success,
    Failure { reason: String },
}

impl AutoloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AutoloadOutcome::Success)
    }
}

/// Classify command output by case-insensitive search for `success_phrase`.
///
/// The exit status is not consulted; only the text decides.
pub fn classify(output: &CommandOutput, success_phrase: &str) -> AutoloadOutcome {
    if output
        .output
        .to_lowercase()
        .contains(&success_phrase.to_lowercase())
    {
        return AutoloadOutcome::Success;
    }

    let status = output
        .status
        .map(|code| code.to_string())
        .unwrap_or_else(|| "signal".to_string());
    let last_line = output
        .output
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("no output");

    AutoloadOutcome::Failure {
        reason: format!("exit status {status}: {}", last_line.trim()),
    }
}

/// Regenerates the autoload map in the project root when watched files
/// come or go.
pub struct AutoloadTrigger {
    runner: Box<dyn AutoloadRunner>,
    root_dir: PathBuf,
    success_phrase: String,
}

impl AutoloadTrigger {
    pub fn new(
        runner: Box<dyn AutoloadRunner>,
        root_dir: PathBuf,
        success_phrase: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            root_dir,
            success_phrase: success_phrase.into(),
        }
    }

    /// React to an add or unlink of `changed`.
    ///
    /// Blocks the caller until the command exits. There is no timeout.
    pub async fn on_file_event(&self, changed: &Path) -> AutoloadOutcome {
        crate::debug_event!(
            "autoload",
            "changed",
            "{}, dumping the autoloader",
            changed.display()
        );
        self.regenerate().await
    }

    /// Run the command once for a coalesced batch of changes.
    pub async fn on_batch(&self, changed: &[PathBuf]) -> AutoloadOutcome {
        crate::debug_event!(
            "autoload",
            "batch",
            "{} files changed, dumping the autoloader",
            changed.len()
        );
        self.regenerate().await
    }

    async fn regenerate(&self) -> AutoloadOutcome {
        let outcome = match self.runner.run(&self.root_dir).await {
            Ok(output) => classify(&output, &self.success_phrase),
            Err(e) => AutoloadOutcome::Failure {
                reason: format!("failed to run autoload command: {e}"),
            },
        };

        match &outcome {
            AutoloadOutcome::Success => crate::log_event!("autoload", "regenerated"),
            AutoloadOutcome::Failure { reason } => {
                tracing::warn!("[autoload] failed: {reason}")
            }
        }

        outcome
    }
}
