//! Identity-scoped cart persistence.
//!
//! The cart is keyed by the owning session identity so that two users on a
//! shared device can never see each other's items. The store itself is a
//! plain string key-value boundary; the deployment decides what backs it
//! (the browser-local store of the web client, or [`MemoryStore`] in
//! process).

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

use backlot_core::SessionIdentity;

/// Key prefix shared by all cart entries.
const KEY_PREFIX: &str = "backlot:cart";

/// Errors surfaced by a cart store.
///
/// Callers treat these as best-effort failures: the session logs and
/// swallows them, and in-memory state stays authoritative.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage read failed: {0}")]
    Read(String),
    #[error("storage write failed: {0}")]
    Write(String),
}

/// Map a session identity to its storage key.
///
/// Authenticated users get a stable per-user key; every anonymous session
/// shares the single guest bucket.
#[must_use]
pub fn storage_key_for(identity: &SessionIdentity) -> String {
    match identity {
        SessionIdentity::User(id) => format!("{KEY_PREFIX}:user:{id}"),
        SessionIdentity::Guest => format!("{KEY_PREFIX}:guest"),
    }
}

/// Persistent key-value boundary for serialized carts.
///
/// Both operations are synchronous from the caller's point of view; any
/// buffering or batching happens behind the implementation.
pub trait CartStore {
    /// Read the raw payload stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] when the backing store fails.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous payload.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] when the backing store fails.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-process store backed by a map. Used in tests and single-process
/// deployments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Read(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Write(e.to_string()))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

impl<S: CartStore + ?Sized> CartStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

impl<S: CartStore + ?Sized> CartStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}
