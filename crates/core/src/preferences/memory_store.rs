use std::collections::HashMap;
use std::sync::RwLock;

use super::PreferenceStore;
use crate::errors::{Error, Result};

/// Process-local preference store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| Error::Preference("Preference store lock poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| Error::Preference("Preference store lock poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| Error::Preference("Preference store lock poisoned".into()))?;
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::PreferenceStoreExt;

    #[test]
    fn test_get_set_remove() {
        let store = InMemoryPreferenceStore::new();
        assert!(store.get("auth_token").unwrap().is_none());

        store.set("auth_token", "abc").unwrap();
        assert_eq!(store.get("auth_token").unwrap().as_deref(), Some("abc"));

        store.remove("auth_token").unwrap();
        assert!(store.get("auth_token").unwrap().is_none());
    }

    #[test]
    fn test_typed_helpers() {
        let store = InMemoryPreferenceStore::new();
        assert_eq!(store.get_i64_or("user_id", 0).unwrap(), 0);
        assert_eq!(store.get_or("objetivo_7", "mantener").unwrap(), "mantener");

        store.set_i64("user_id", 7).unwrap();
        assert_eq!(store.get_i64_or("user_id", 0).unwrap(), 7);

        store.set("user_id", "seven").unwrap();
        assert!(matches!(
            store.get_i64_or("user_id", 0),
            Err(Error::Preference(_))
        ));
    }
}
