//! Composer manifest (composer.json) reading.
//!
//! Only the fields the reconciler needs are modelled: `name`, the keys of
//! `require`, and the `repositories` list. Everything else in the document
//! is ignored.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::{ReconcileError, ReconcileResult};

/// File name of a Composer manifest.
pub const MANIFEST_FILE: &str = "composer.json";

/// Directory (relative to the project root) Composer installs packages into.
pub const VENDOR_DIR: &str = "vendor";

/// Repository type for local directories.
const PATH_REPOSITORY: &str = "path";

/// The subset of composer.json the reconciler consults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    /// Package name, e.g. `acme/lib`.
    #[serde(default)]
    pub name: Option<String>,

    /// Dependency name -> version constraint. Only the keys are used.
    #[serde(default)]
    pub require: HashMap<String, Value>,

    /// Repository declarations in declaration order.
    #[serde(default, deserialize_with = "deserialize_repositories")]
    pub repositories: Vec<RepositoryDeclaration>,
}

/// A single entry of the `repositories` list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RepositoryDeclaration {
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Relative (to the project root) or absolute location.
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub options: Map<String, Value>,
}

impl Manifest {
    /// Read and parse a manifest from disk.
    ///
    /// Both IO and JSON failures map to `ManifestParse`.
    pub fn load(path: &Path) -> ReconcileResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ReconcileError::ManifestParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_json(&content).map_err(|e| ReconcileError::ManifestParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Parse a manifest from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Whether `name` is a key of `require`.
    pub fn requires(&self, name: &str) -> bool {
        self.require.contains_key(name)
    }
}

impl RepositoryDeclaration {
    pub fn is_path(&self) -> bool {
        self.kind == PATH_REPOSITORY
    }

    /// `options.watch` must be the JSON boolean `true`; truthy strings or
    /// numbers do not count.
    pub fn is_watched(&self) -> bool {
        matches!(self.options.get("watch"), Some(Value::Bool(true)))
    }
}

/// Accept both the list form and the keyed-object form of `repositories`.
///
/// Entries that are not objects (Composer allows e.g. `false` to disable a
/// repository) become empty, ineligible declarations.
fn deserialize_repositories<'de, D>(deserializer: D) -> Result<Vec<RepositoryDeclaration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;

    let entries: Vec<Value> = match raw {
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        Value::Null => Vec::new(),
        other => {
            return Err(serde::de::Error::custom(format!(
                "repositories must be a list or an object, got {other}"
            )));
        }
    };

    entries
        .into_iter()
        .map(|entry| match entry {
            Value::Object(_) => serde_json::from_value(entry).map_err(serde::de::Error::custom),
            _ => Ok(RepositoryDeclaration::default()),
        })
        .collect()
}
