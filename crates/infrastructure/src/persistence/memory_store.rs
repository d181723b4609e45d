//! In-process key-value store.

use std::collections::HashMap;

use parking_lot::Mutex;
use warden_application::ports::{KeyValueStore, StorageError};

/// Map-backed store; contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("token").unwrap(), None);

        store.set("token", "T1").unwrap();
        store.set("token", "T2").unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("T2"));

        store.remove("token").unwrap();
        store.remove("token").unwrap();
        assert_eq!(store.get("token").unwrap(), None);
    }
}
