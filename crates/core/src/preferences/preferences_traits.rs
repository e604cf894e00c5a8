use crate::errors::{Error, Result};

/// Narrow key-value capability used for the session credentials and the
/// per-user goal cache.
///
/// Implementations must be cheap to call; the pipeline reads them on login,
/// restore and goal recomputation only.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Typed helpers over any [`PreferenceStore`].
pub trait PreferenceStoreExt: PreferenceStore {
    /// Value for `key`, or `default` when absent.
    fn get_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self.get(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// Integer value for `key`, or `default` when absent.
    fn get_i64_or(&self, key: &str, default: i64) -> Result<i64> {
        match self.get(key)? {
            Some(raw) => raw.trim().parse::<i64>().map_err(|e| {
                Error::Preference(format!("Value for '{}' is not an integer: {}", key, e))
            }),
            None => Ok(default),
        }
    }

    fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.set(key, &value.to_string())
    }
}

impl<T: PreferenceStore + ?Sized> PreferenceStoreExt for T {}
