/// File-backed credential storage
///
/// Persists the credential map as a single JSON file, by default under the
/// platform data directory (e.g. `~/.local/share/taskdeck/credentials.json`
/// on Linux). A missing file reads as an empty map so a fresh install
/// starts unauthenticated without any setup.
///
/// Writes go through an internal mutex so concurrent `set`/`remove_all`
/// calls cannot interleave their read-modify-write cycles.
///
/// # Example
///
/// ```no_run
/// use taskdeck_client::credentials::{keys, CredentialStore, FileCredentialStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = FileCredentialStore::new(FileCredentialStore::default_path());
/// store.set(keys::TOKEN, "t1").await?;
/// assert_eq!(store.get(keys::TOKEN).await?.as_deref(), Some("t1"));
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{CredentialStore, StorageError};

/// Credential store backed by a JSON file
pub struct FileCredentialStore {
    /// Path of the backing file
    path: PathBuf,

    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Creates a store backed by the file at `path`
    ///
    /// The file and its parent directories are created lazily on the first
    /// write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCredentialStore {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Default location in the platform data directory
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("taskdeck")
            .join("credentials.json")
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<HashMap<String, String>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_map(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(map)?).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.read_map().await?;
        Ok(map.get(key).cloned())
    }

    async fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        for key in keys {
            map.remove(*key);
        }
        self.write_map(&map).await
    }
}
