//! JSON-file backed preference store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::PreferenceError;
use super::store::KeyValueStore;

/// Default preferences file name.
const DEFAULT_FILE_NAME: &str = "velo_prefs.json";

/// On-disk layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferencesFile {
    /// Format version, for future migrations.
    version: u32,
    /// The stored values.
    values: BTreeMap<String, String>,
}

/// Preference store persisted as a JSON file.
///
/// The whole file is rewritten on every `set`. A missing, unreadable or
/// corrupt file is treated as empty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, loading any existing values.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = load(&path).unwrap_or_default();
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// Open the store at the default location in the current directory.
    pub fn open_default() -> Self {
        Self::open(DEFAULT_FILE_NAME)
    }

    /// Get the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, values: &BTreeMap<String, String>) -> Result<(), PreferenceError> {
        // Create parent directories if needed
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| PreferenceError::Io {
                message: format!("failed to create preferences directory: {}", e),
            })?;
        }

        let file = PreferencesFile {
            version: 1,
            values: values.clone(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| PreferenceError::Serialize {
            message: e.to_string(),
        })?;

        std::fs::write(&self.path, json).map_err(|e| PreferenceError::Io {
            message: format!("failed to write preferences file: {}", e),
        })
    }
}

fn load(path: &Path) -> Option<BTreeMap<String, String>> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<PreferencesFile>(&contents) {
        Ok(file) => Some(file.values),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring corrupt preferences file");
            None
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let guard = self.values.lock().unwrap_or_else(|e| e.into_inner());
        guard.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut guard = self.values.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(key.to_string(), value.to_string());
        self.write(&guard)
    }
}
