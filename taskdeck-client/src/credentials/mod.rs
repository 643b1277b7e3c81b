/// Durable credential storage
///
/// This module defines the contract for the key/value store that keeps a
/// session alive across process restarts, plus the two implementations the
/// client ships with.
///
/// # Storage Contract
///
/// All stores must:
/// 1. Implement the `CredentialStore` trait (async)
/// 2. Treat a missing key as `None`, never as an error
/// 3. Replace existing values on `set`
/// 4. Ignore missing keys on `remove_all`
///
/// Exactly two logical keys are in use (see [`keys`]): the opaque bearer
/// token and the JSON-serialized user record, written together on login and
/// removed together on logout. No expiry and no encryption are applied
/// beyond what the backing platform storage provides.
///
/// # Implementations
///
/// - [`FileCredentialStore`]: JSON file in the platform data directory
/// - [`MemoryCredentialStore`]: process-local map, for tests and ephemeral
///   sessions

use async_trait::async_trait;

pub mod file;
pub mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

/// Logical storage keys for the persisted session
pub mod keys {
    /// Opaque bearer token issued by the API on login
    pub const TOKEN: &str = "token";

    /// JSON-serialized user record
    pub const USER: &str = "user";
}

/// Credential storage error
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Backing storage could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored values could not be encoded or decoded
    #[error("Failed to encode stored values: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable key/value storage for session credentials
///
/// Lookups are asynchronous: platform-backed stores may hit the disk, and
/// the transport awaits the token read before dispatching a request.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Reads the value stored under `key`
    ///
    /// Absence is a normal outcome ("no session"), not an error.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Removes every listed key; missing keys are ignored
    async fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError>;
}
