//! File-backed key-value store.
//!
//! All keys live in one JSON object on disk:
//! ```json
//! {
//!   "token": "eyJhbGciOi...",
//!   "token_exp_ms": "1767225600000",
//!   "user": "{\"name\":\"Ana\"}"
//! }
//! ```
//! The file is read once at open. Every change rewrites it through a
//! temporary sibling and a rename, so a crash never leaves a half-written
//! session behind.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;
use warden_application::ports::{KeyValueStore, StorageError};

const APP_DIR: &str = "warden";
const FILE_NAME: &str = "session.json";

/// Durable store persisting a JSON map to a single file.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    /// Opens the store at `path`, loading existing contents.
    ///
    /// A missing or empty file yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON object
    /// of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| StorageError::Serialization(format!("{}: {e}", path.display())))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), keys = values.len(), "opened session file");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Default location: `<data dir>/warden/session.json`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(APP_DIR).join(FILE_NAME))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut content = serde_json::to_vec_pretty(values)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        content.push(b'\n');

        let tmp = self.path.with_extension("json.tmp");
        let mut file = Self::create_private(&tmp)?;
        file.write_all(&content)?;
        file.sync_all()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    #[cfg(unix)]
    fn create_private(path: &Path) -> std::io::Result<fs::File> {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
    }

    #[cfg(not(unix))]
    fn create_private(path: &Path) -> std::io::Result<fs::File> {
        fs::File::create(path)
    }

    /// Applies `change` to a copy of the map and commits it once written.
    fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), StorageError> {
        let mut values = self.values.lock();
        let mut next = values.clone();
        if !change(&mut next) {
            return Ok(());
        }
        self.persist(&next)?;
        *values = next;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|map| {
            let previous = map.insert(key.to_string(), value.to_string());
            previous.as_deref() != Some(value)
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|map| map.remove(key).is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_opens_empty() {
        let dir = tempdir().unwrap();
        let store = FileKeyValueStore::open(dir.path().join("session.json")).unwrap();
        assert_eq!(store.get("token").unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileKeyValueStore::open(&path).unwrap();
        store.set("token", "T1").unwrap();
        store.set("token_exp_ms", "1767225600000").unwrap();
        store.remove("token_exp_ms").unwrap();
        drop(store);

        let reopened = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("T1"));
        assert_eq!(reopened.get("token_exp_ms").unwrap(), None);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_is_a_plain_json_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileKeyValueStore::open(&path).unwrap();
        store.set("user", r#"{"name":"Ana"}"#).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["user"], r#"{"name":"Ana"}"#);
    }

    #[test]
    fn test_corrupt_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "[1, 2").unwrap();

        assert!(matches!(
            FileKeyValueStore::open(&path),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_empty_file_opens_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "  \n").unwrap();
        let store = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(store.get("token").unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileKeyValueStore::open(&path).unwrap();
        store.set("token", "T1").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
