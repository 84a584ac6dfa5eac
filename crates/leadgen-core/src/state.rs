//! Shared, observable handle to the lead collection.
//!
//! Writers are serialized and each one starts from the latest published
//! snapshot, so two actions that complete in either order never overwrite
//! each other with a stale copy. Observers are woken after each committed
//! change.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::lead::Lead;
use crate::store::LeadStore;

#[derive(Debug, Clone)]
pub struct LeadState {
    tx: Arc<watch::Sender<LeadStore>>,
    write: Arc<Mutex<()>>,
}

impl Default for LeadState {
    fn default() -> Self {
        Self::new(LeadStore::default())
    }
}

impl LeadState {
    #[must_use]
    pub fn new(store: LeadStore) -> Self {
        let (tx, _rx) = watch::channel(store);
        Self {
            tx: Arc::new(tx),
            write: Arc::new(Mutex::new(())),
        }
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cheap copy of the current store (shares the snapshot allocation).
    #[must_use]
    pub fn snapshot(&self) -> LeadStore {
        self.tx.borrow().clone()
    }

    /// Run `f` against the latest store and publish the result.
    ///
    /// Returns whatever `f` returns plus the store as it stands right after
    /// `f`, ready to be pushed to the remote document in one shot.
    pub fn mutate<R, F>(&self, f: F) -> (R, LeadStore)
    where
        F: FnOnce(&mut LeadStore) -> R,
    {
        let _guard = self.write_lock();
        let mut store = self.snapshot();
        let out = f(&mut store);
        self.tx.send_replace(store.clone());
        (out, store)
    }

    /// Replace the whole collection, e.g. from a remote document.
    pub fn replace(&self, leads: Vec<Lead>) {
        let _guard = self.write_lock();
        self.tx.send_modify(|store| store.replace(leads));
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LeadStore> {
        self.tx.subscribe()
    }
}
