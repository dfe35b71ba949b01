//! Two-layer credential store.
//!
//! The current bearer token lives in an in-memory context for the lifetime of
//! the running process and in a durable slot that survives restarts. All
//! reads and writes of the durable slot go through [`CredentialStore`]; no
//! other module touches it.

use std::path::PathBuf;
use std::sync::Arc;

use keyring::Entry;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

/// Keychain service name for the keyring-backed slot
const SERVICE_NAME: &str = "storedesk";

/// Name of the durable key holding the raw token
pub const TOKEN_SLOT_NAME: &str = "token";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Refusing to store an empty credential")]
    EmptyCredential,

    #[error("Credential file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// The durable half of the store.
pub trait DurableSlot: Send {
    fn read(&self) -> Result<Option<String>, StoreError>;
    fn write(&mut self, token: &str) -> Result<(), StoreError>;
    /// Removing an absent value succeeds.
    fn remove(&mut self) -> Result<(), StoreError>;
}

/// Raw token kept in a single file.
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl DurableSlot for FileSlot {
    fn read(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, token: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        Ok(())
    }

    fn remove(&mut self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Raw token kept in the OS keychain.
pub struct KeyringSlot {
    entry: Entry,
}

impl KeyringSlot {
    pub fn new() -> Result<Self, StoreError> {
        Ok(Self {
            entry: Entry::new(SERVICE_NAME, TOKEN_SLOT_NAME)?,
        })
    }
}

impl DurableSlot for KeyringSlot {
    fn read(&self) -> Result<Option<String>, StoreError> {
        match self.entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, token: &str) -> Result<(), StoreError> {
        self.entry.set_password(token)?;
        Ok(())
    }

    fn remove(&mut self) -> Result<(), StoreError> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local slot. Clones share the same cell, so a fresh
/// [`CredentialStore`] built over a clone behaves like a restarted process
/// reading the same durable storage.
#[derive(Clone, Default)]
pub struct MemorySlot {
    cell: Arc<Mutex<Option<String>>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableSlot for MemorySlot {
    fn read(&self) -> Result<Option<String>, StoreError> {
        Ok(self.cell.lock().clone())
    }

    fn write(&mut self, token: &str) -> Result<(), StoreError> {
        *self.cell.lock() = Some(token.to_string());
        Ok(())
    }

    fn remove(&mut self) -> Result<(), StoreError> {
        *self.cell.lock() = None;
        Ok(())
    }
}

struct Layers {
    context: Option<String>,
    slot: Box<dyn DurableSlot>,
}

/// Holder of the current credential.
/// Clone is cheap; clones share both layers.
#[derive(Clone)]
pub struct CredentialStore {
    layers: Arc<Mutex<Layers>>,
}

impl CredentialStore {
    /// Create a store with an empty in-memory context over `slot`.
    pub fn new(slot: impl DurableSlot + 'static) -> Self {
        Self {
            layers: Arc::new(Mutex::new(Layers {
                context: None,
                slot: Box::new(slot),
            })),
        }
    }

    /// Store backed only by process memory.
    pub fn in_memory() -> Self {
        Self::new(MemorySlot::new())
    }

    /// Store `token` in both layers, replacing any previous credential.
    ///
    /// The lock is held across both writes. If the durable write fails the
    /// in-memory context is left as it was.
    pub fn set(&self, token: &str) -> Result<(), StoreError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(StoreError::EmptyCredential);
        }

        let mut layers = self.layers.lock();
        layers.slot.write(token)?;
        layers.context = Some(token.to_string());
        debug!("Credential stored");
        Ok(())
    }

    /// Current credential: in-memory context first, then the durable slot.
    ///
    /// A durable read failure is logged and reported as absent.
    pub fn get(&self) -> Option<String> {
        let mut layers = self.layers.lock();
        if let Some(ref token) = layers.context {
            return Some(token.clone());
        }

        match layers.slot.read() {
            Ok(Some(token)) => {
                let token = token.trim();
                if token.is_empty() {
                    return None;
                }
                layers.context = Some(token.to_string());
                debug!("Credential restored from durable slot");
                Some(token.to_string())
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read durable credential slot");
                None
            }
        }
    }

    pub fn is_present(&self) -> bool {
        self.get().is_some()
    }

    /// Remove the credential from both layers. Idempotent.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut layers = self.layers.lock();
        layers.context = None;
        layers.slot.remove()?;
        debug!("Credential cleared");
        Ok(())
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let has_context = self.layers.lock().context.is_some();
        f.debug_struct("CredentialStore")
            .field("context", &if has_context { "<redacted>" } else { "<empty>" })
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let store = CredentialStore::in_memory();
        store.set("abc.def.ghi").unwrap();
        assert_eq!(store.get().as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_set_overwrites_previous() {
        let store = CredentialStore::in_memory();
        store.set("first.token.value").unwrap();
        store.set("second.token.value").unwrap();
        assert_eq!(store.get().as_deref(), Some("second.token.value"));
    }

    #[test]
    fn test_survives_reload_via_durable_slot() {
        let slot = MemorySlot::new();
        let store = CredentialStore::new(slot.clone());
        store.set("abc.def.ghi").unwrap();

        // A new store starts with an empty context, like a restarted process
        let reloaded = CredentialStore::new(slot);
        assert_eq!(reloaded.get().as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_clear_removes_both_layers() {
        let slot = MemorySlot::new();
        let store = CredentialStore::new(slot.clone());
        store.set("abc.def.ghi").unwrap();
        store.clear().unwrap();

        assert!(store.get().is_none());
        assert!(CredentialStore::new(slot).get().is_none());
    }

    #[test]
    fn test_clear_absent_is_noop() {
        let store = CredentialStore::in_memory();
        assert!(store.clear().is_ok());
        assert!(store.clear().is_ok());
        assert!(!store.is_present());
    }

    #[test]
    fn test_blank_credentials_rejected_and_ignored() {
        let slot = MemorySlot::new();
        let store = CredentialStore::new(slot.clone());
        assert!(matches!(store.set("   "), Err(StoreError::EmptyCredential)));

        let mut raw = slot.clone();
        raw.write("  \n").unwrap();
        assert!(CredentialStore::new(slot).get().is_none());
    }

    #[test]
    fn test_clones_share_layers() {
        let store = CredentialStore::in_memory();
        let other = store.clone();
        store.set("abc.def.ghi").unwrap();
        assert_eq!(other.get().as_deref(), Some("abc.def.ghi"));
        other.clear().unwrap();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_file_slot_roundtrip_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(TOKEN_SLOT_NAME);

        let store = CredentialStore::new(FileSlot::new(path.clone()));
        store.set("abc.def.ghi").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "abc.def.ghi");

        let reloaded = CredentialStore::new(FileSlot::new(path.clone()));
        assert_eq!(reloaded.get().as_deref(), Some("abc.def.ghi"));

        reloaded.clear().unwrap();
        assert!(!path.exists());
        assert!(reloaded.clear().is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let store = CredentialStore::in_memory();
        store.set("secret.token.value").unwrap();
        let rendered = format!("{:?}", store);
        assert!(!rendered.contains("secret"));
    }
}
