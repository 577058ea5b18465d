//! Session token store.
//!
//! # Design
//! A `Session` is a shared handle to exactly one token slot. The slot is
//! mirrored into a `TokenStorage` under [`TOKEN_KEY`] so a token survives a
//! restart when the storage is durable. Reads are served from memory; a
//! failed storage write is logged and otherwise ignored, so the value read
//! back is always the value last written.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::warn;

/// Storage key the token is persisted under.
pub const TOKEN_KEY: &str = "auth_token";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Key/value persistence behind a `Session`.
pub trait TokenStorage: fmt::Debug + Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn store(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-scoped storage; gone when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// One file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl TokenStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn store(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Shared handle to the single token slot.
///
/// Clones share the slot: a token set through one clone is visible through
/// every other, which is how one login serves several clients.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    slot: RwLock<Option<String>>,
    storage: Box<dyn TokenStorage>,
}

impl Session {
    /// A session backed by process memory.
    pub fn new() -> Self {
        Self::with_storage(MemoryStorage::new())
    }

    /// A session backed by `storage`, starting from whatever token it
    /// already holds.
    pub fn with_storage(storage: impl TokenStorage + 'static) -> Self {
        let initial = match storage.load(TOKEN_KEY) {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "could not load stored session token");
                None
            }
        };
        Self {
            inner: Arc::new(SessionInner {
                slot: RwLock::new(initial),
                storage: Box::new(storage),
            }),
        }
    }

    /// The current token, read at call time.
    pub fn token(&self) -> Option<String> {
        self.inner
            .slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replace the token; `None` clears it.
    pub fn set_token(&self, token: Option<&str>) {
        let mut slot = self.inner.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = token.map(str::to_string);

        let persisted = match token {
            Some(value) => self.inner.storage.store(TOKEN_KEY, value),
            None => self.inner.storage.remove(TOKEN_KEY),
        };
        if let Err(err) = persisted {
            warn!(error = %err, "could not persist session token");
        }
    }

    pub fn clear(&self) {
        self.set_token(None);
    }

    /// True when a bearer header would be sent; an empty token does not count.
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the token itself.
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("storage", &self.inner.storage)
            .finish()
    }
}
