//! Durable cart storage.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when reading or writing cart storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A single slot holding the serialized cart.
pub trait CartStorage {
    /// Read the slot. `Ok(None)` means nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read.
    fn read(&self) -> Result<Option<String>, StorageError>;

    /// Replace the slot's contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    fn write(&self, contents: &str) -> Result<(), StorageError>;
}

/// Cart stored as a JSON file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A temp file next to the cart, unique per write so concurrent writers
    /// never share one.
    fn temp_path(&self) -> PathBuf {
        let mut name = std::ffi::OsString::from(".");
        if let Some(file_name) = self.path.file_name() {
            name.push(file_name);
        }
        name.push(format!(".tmp.{}", Uuid::new_v4().simple()));
        self.path.with_file_name(name)
    }
}

impl CartStorage for FileStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        // Readers never observe a half-written cart
        let temp = self.temp_path();
        std::fs::write(&temp, contents)?;
        if let Err(e) = std::fs::rename(&temp, &self.path) {
            let _ = std::fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }
}

/// In-process storage. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        self.slot
            .lock()
            .map(|slot| slot.clone())
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        *slot = Some(contents.to_string());
        Ok(())
    }
}
