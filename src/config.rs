//! Configuration for composer-watch.
//!
//! Layered with figment, later layers win:
//! - Default values
//! - TOML settings file (`.composer-watch.toml` in the project root, or `--config`)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `COMPOSER_WATCH_` and use
//! double underscores to separate nested levels:
//! - `COMPOSER_WATCH_WATCH__POLL_INTERVAL_MS=500` sets `watch.poll_interval_ms`
//! - `COMPOSER_WATCH_AUTOLOAD__PROGRAM=/usr/local/bin/composer` sets `autoload.program`
//! - `COMPOSER_WATCH_LOGGING__DEFAULT=info` sets `logging.default`

use std::collections::HashMap;
use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// Settings file looked up in the project root.
pub const SETTINGS_FILE: &str = ".composer-watch.toml";

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "COMPOSER_WATCH_";

/// Log target of this crate, used by `--debug`.
const CRATE_TARGET: &str = "composer_watch";

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Filesystem watcher settings
    #[serde(default)]
    pub watch: WatchConfig,

    /// Autoload regeneration command
    #[serde(default)]
    pub autoload: AutoloadConfig,

    /// Log levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchConfig {
    /// Polling interval of the watcher in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Follow symlinked directories inside watched repositories
    #[serde(default = "default_true")]
    pub follow_symlinks: bool,

    /// Quiet period before a burst of add/unlink events triggers one
    /// autoload run. 0 runs the command for every event.
    #[serde(default)]
    pub debounce_ms: u64,

    /// Recompute links when the root composer.json changes
    #[serde(default = "default_true")]
    pub reload_on_manifest_change: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AutoloadConfig {
    /// Executable of the dependency manager
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments that regenerate the autoloader
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Case-insensitive phrase whose presence in the output means success
    #[serde(default = "default_success_phrase")]
    pub success_phrase: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Level for everything without a module override
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `composer_watch = "debug"`
    #[serde(default = "default_log_modules")]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_program() -> String {
    "composer".to_string()
}
fn default_args() -> Vec<String> {
    vec!["dump-autoload".to_string()]
}
fn default_success_phrase() -> String {
    "generated autoload files".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_log_modules() -> HashMap<String, String> {
    HashMap::from([(CRATE_TARGET.to_string(), "warn".to_string())])
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            follow_symlinks: true,
            debounce_ms: 0,
            reload_on_manifest_change: true,
        }
    }
}

impl Default for AutoloadConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            success_phrase: default_success_phrase(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: default_log_modules(),
        }
    }
}

impl Settings {
    /// Load settings for the project in `root_dir`.
    ///
    /// A missing settings file is not an error; defaults apply.
    pub fn load(root_dir: &Path) -> Result<Self, Box<figment::Error>> {
        Self::load_from(root_dir.join(SETTINGS_FILE))
    }

    /// Load settings from a specific file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore (__) separates nested levels
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Raise this crate's log level to debug (`--debug`).
    pub fn enable_debug(&mut self) {
        self.logging
            .modules
            .insert(CRATE_TARGET.to_string(), "debug".to_string());
    }
}
