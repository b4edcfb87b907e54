//! Durable cart storage.
//!
//! A [`StorageSlot`] is a string key-value area that outlives a single
//! session (the browser's local storage, or a directory of files for the
//! CLI). [`CartStore`] serializes the cart into one well-known key and never
//! lets a storage failure reach the caller: corrupt data reads as an empty
//! cart, and failed writes are logged and leave the previous value in place.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::domain::{Cart, LineItem};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Corrupt cart data: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Raw string storage keyed by name.
pub trait StorageSlot {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory slot. Clones share the same entries, the way two tabs share
/// one browser profile's storage.
#[derive(Clone, Debug, Default)]
pub struct MemorySlot {
    entries: Rc<RefCell<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemorySlot {
    pub fn new() -> Self { Self::default() }

    /// Caps the total stored bytes; writes beyond it fail.
    pub fn with_quota(quota: usize) -> Self { Self { quota: Some(quota), ..Self::default() } }

    fn used_except(&self, key: &str) -> usize {
        self.entries.borrow().iter().filter(|(k, _)| k.as_str() != key).map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl StorageSlot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(quota) = self.quota {
            let needed = self.used_except(key) + key.len() + value.len();
            if needed > quota { return Err(StoreError::QuotaExceeded { needed, quota }); }
        }
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under a directory.
#[derive(Clone, Debug)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }
    pub fn path_for(&self, key: &str) -> PathBuf { self.dir.join(format!("{key}.json")) }
}

impl StorageSlot for FileSlot {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        // Write beside the target and rename so a failed write never
        // truncates the previous cart. One temp file per write.
        let tmp = self.dir.join(format!(".{key}.{}.tmp", Uuid::new_v4().simple()));
        fs::write(&tmp, value)?;
        if let Err(e) = fs::rename(&tmp, self.path_for(key)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Cart persistence over a slot.
#[derive(Clone, Debug)]
pub struct CartStore<S> {
    slot: S,
    key: String,
}

impl<S: StorageSlot> CartStore<S> {
    pub fn new(slot: S, key: impl Into<String>) -> Self { Self { slot, key: key.into() } }

    pub fn slot(&self) -> &S { &self.slot }

    /// Reads the persisted cart. Missing or unreadable data yields an empty
    /// cart; corrupt data is also deleted from the slot.
    pub fn load(&self) -> Cart {
        let raw = match self.slot.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Cart::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read cart, starting empty");
                return Cart::new();
            }
        };

        let rows: Vec<LineItem> = match serde_json::from_str(&raw) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding corrupt cart data");
                if let Err(e) = self.slot.remove(&self.key) {
                    warn!(key = %self.key, error = %e, "Failed to discard corrupt cart data");
                }
                return Cart::new();
            }
        };

        let stored = rows.len();
        let cart = Cart::from_items(rows);
        if cart.len() != stored {
            warn!(key = %self.key, dropped = stored - cart.len(), "Dropped invalid cart rows");
        }
        debug!(key = %self.key, items = cart.len(), "Cart loaded");
        cart
    }

    /// Persists `items`. Failures are logged; the previously stored value
    /// is left as it was.
    pub fn save(&self, items: &[LineItem]) {
        if let Err(e) = self.try_save(items) {
            error!(key = %self.key, error = %e, "Failed to persist cart; changes will not survive a reload");
        }
    }

    fn try_save(&self, items: &[LineItem]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(items)?;
        self.slot.write(&self.key, &raw)
    }
}
