/// In-memory credential storage
///
/// Keeps credentials in a process-local map. Nothing survives a restart, so
/// this is for tests and for ephemeral sessions that should never touch the
/// disk.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{CredentialStore, StorageError};

/// Credential store that lives and dies with the process
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.read().unwrap().get(key).cloned())
    }

    async fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut values = self.values.write().unwrap();
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}
