//! # Key Store Handle
//!
//! Shared, copy-on-write access to the current [`KeyStore`].
//!
//! ## Thread Safety
//!
//! Readers take an `Arc` snapshot and release the lock immediately, so a
//! decode in flight keeps the store it started with even if an operator
//! rotates keys mid-way. `replace` swaps the whole store atomically; readers
//! observe either the old or the new store, never a mixture.

use crate::domain::KeyStore;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// Cloneable handle to the current key store.
#[derive(Clone, Debug)]
pub struct KeyStoreHandle {
    current: Arc<RwLock<Arc<KeyStore>>>,
}

impl KeyStoreHandle {
    pub fn new(store: KeyStore) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(store))),
        }
    }

    /// Current store. Holding the snapshot does not block rotation.
    pub fn snapshot(&self) -> Arc<KeyStore> {
        Arc::clone(&self.current.read())
    }

    /// Swap in a new store, returning the previous one.
    pub fn replace(&self, store: KeyStore) -> Arc<KeyStore> {
        let next = Arc::new(store);
        let previous = std::mem::replace(&mut *self.current.write(), next);
        info!(
            tokens = self.current.read().token_names().count(),
            "Key store replaced"
        );
        previous
    }
}
