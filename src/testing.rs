//! Test doubles for the watch backend and the autoload runner.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::autoload::{AutoloadRunner, CommandOutput};
use crate::watcher::{WatchBackend, WatchError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Watch(PathBuf),
    Unwatch(PathBuf),
}

#[derive(Debug, Default)]
struct BackendState {
    watched: HashSet<PathBuf>,
    calls: Vec<BackendCall>,
}

/// In-memory backend; clones share state so tests keep a handle after
/// moving one into the reconciler.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    state: Arc<Mutex<BackendState>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watched(&self) -> HashSet<PathBuf> {
        self.state.lock().unwrap().watched.clone()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl WatchBackend for RecordingBackend {
    fn watch(&mut self, path: &Path) -> Result<(), WatchError> {
        let mut state = self.state.lock().unwrap();
        state.watched.insert(path.to_path_buf());
        state.calls.push(BackendCall::Watch(path.to_path_buf()));
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> Result<(), WatchError> {
        let mut state = self.state.lock().unwrap();
        state.watched.remove(path);
        state.calls.push(BackendCall::Unwatch(path.to_path_buf()));
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum RunnerBehavior {
    Output(String),
    Error,
}

/// Runner that records each working directory it was invoked with.
#[derive(Debug, Clone)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<PathBuf>>>,
    behavior: RunnerBehavior,
}

impl RecordingRunner {
    pub fn succeeding() -> Self {
        Self::with_output("Generating autoload files\nGenerated autoload files\n")
    }

    pub fn with_output(text: &str) -> Self {
        Self {
            calls: Arc::default(),
            behavior: RunnerBehavior::Output(text.to_string()),
        }
    }

    pub fn erroring() -> Self {
        Self {
            calls: Arc::default(),
            behavior: RunnerBehavior::Error,
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<PathBuf>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl AutoloadRunner for RecordingRunner {
    async fn run(&self, cwd: &Path) -> io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(cwd.to_path_buf());
        match &self.behavior {
            RunnerBehavior::Output(text) => Ok(CommandOutput {
                output: text.clone(),
                status: Some(0),
            }),
            RunnerBehavior::Error => Err(io::Error::new(
                io::ErrorKind::NotFound,
                "composer: command not found",
            )),
        }
    }
}
