//! Durable storage for the session token.
//!
//! The token is a single opaque string under a single key. It is never
//! parsed or interpreted here.

use std::path::PathBuf;
use std::sync::Mutex;

use keyring::Entry;
use thiserror::Error;
use tracing::debug;

use crate::config::{Config, TokenStorageKind};

/// Token file name in the data directory
const TOKEN_FILE: &str = "token";

const KEYRING_SERVICE: &str = "peiban";
const KEYRING_ACCOUNT: &str = "session-token";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Token file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Result<Option<String>, StorageError>;
    fn save(&self, token: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// Build the storage backend selected in the config.
pub fn from_config(config: &Config) -> anyhow::Result<Box<dyn TokenStorage>> {
    Ok(match config.token_storage {
        TokenStorageKind::File => Box::new(FileTokenStorage::new(config.data_dir()?)),
        TokenStorageKind::Keyring => Box::new(KeyringTokenStorage),
    })
}

/// Token kept as a plain file in the data directory.
pub struct FileTokenStorage {
    dir: PathBuf,
}

impl FileTokenStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        let path = self.token_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let token = contents.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    fn save(&self, token: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.token_path(), token)?;
        debug!(path = %self.token_path().display(), "Token saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let path = self.token_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Token kept in the OS keychain.
pub struct KeyringTokenStorage;

impl KeyringTokenStorage {
    fn entry() -> Result<Entry, StorageError> {
        Ok(Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT)?)
    }
}

impl TokenStorage for KeyringTokenStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match Self::entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &str) -> Result<(), StorageError> {
        Self::entry()?.set_password(token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process storage, lost at exit.
#[derive(Default)]
pub struct MemoryTokenStorage {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.slot().clone())
    }

    fn save(&self, token: &str) -> Result<(), StorageError> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileTokenStorage::new(dir.path().join("nested"));

        assert_eq!(storage.load().unwrap(), None);
        storage.save("abc123").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("abc123"));
        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap(), None);
        // Clearing twice is fine
        storage.clear().unwrap();
    }

    #[test]
    fn test_file_storage_ignores_blank_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TOKEN_FILE), "  \n").unwrap();
        let storage = FileTokenStorage::new(dir.path().to_path_buf());
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryTokenStorage::with_token("t");
        assert_eq!(storage.load().unwrap().as_deref(), Some("t"));
        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap(), None);
    }
}
