use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::PreferenceStore;
use crate::errors::{Error, Result};

const CURRENT_VERSION: u32 = 1;

/// Preference store persisted as a small JSON document.
///
/// Every write rewrites the whole file; the store only ever holds a handful
/// of keys per user.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    lock: Mutex<()>,
}

#[derive(Serialize, Deserialize, Default)]
struct PreferenceFile {
    version: u32,
    values: HashMap<String, String>,
}

impl FilePreferenceStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn with_values<F>(&self, op: F) -> Result<()>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::Preference("Preference file lock poisoned".into()))?;
        let mut values = self.load_locked()?;
        op(&mut values);
        self.persist_locked(values)
    }

    fn load_locked(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let raw = fs::read(&self.path).map_err(|e| {
            Error::Preference(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        if raw.is_empty() {
            return Ok(HashMap::new());
        }

        let file: PreferenceFile = serde_json::from_slice(&raw).map_err(|e| {
            Error::Preference(format!("Corrupt preference file {}: {}", self.path.display(), e))
        })?;
        Ok(file.values)
    }

    fn persist_locked(&self, values: HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| Error::Preference(format!("Failed to create directory: {}", e)))?;
            }
        }

        let file = PreferenceFile {
            version: CURRENT_VERSION,
            values,
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::Preference(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| {
            Error::Preference(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::Preference("Preference file lock poisoned".into()))?;
        Ok(self.load_locked()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_values(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.with_values(|values| {
            values.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("nested").join("prefs.json");

        let store = FilePreferenceStore::new(file.clone());
        store.set("auth_token", "token-1").unwrap();
        store.set("user_id", "7").unwrap();
        assert!(file.exists());

        let reopened = FilePreferenceStore::new(file);
        assert_eq!(reopened.get("auth_token").unwrap().as_deref(), Some("token-1"));
        assert_eq!(reopened.get("user_id").unwrap().as_deref(), Some("7"));

        reopened.remove("auth_token").unwrap();
        assert!(reopened.get("auth_token").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("prefs.json");
        fs::write(&file, "not json").unwrap();

        let store = FilePreferenceStore::new(file);
        assert!(matches!(store.get("auth_token"), Err(Error::Preference(_))));
    }
}
