//! Local key-value preferences (session credentials, goal cache).

mod file_store;
mod memory_store;
mod preferences_traits;

pub use file_store::FilePreferenceStore;
pub use memory_store::InMemoryPreferenceStore;
pub use preferences_traits::{PreferenceStore, PreferenceStoreExt};
