use std::sync::{Arc, RwLock};

use dhtkv_table::Keyer;

use crate::ledger::Ledger;
use crate::traits::Storer;

/// [`Storer`] backed by a single `RwLock` around the ledger.
///
/// Readers share the lock; `transact` holds the write lock for the whole
/// closure, so a read-modify-write inside one transaction is atomic.
pub struct SyncStore {
    inner: RwLock<Ledger>,
}

impl SyncStore {
    /// Create an empty store keyed by `keyer`.
    pub fn new(keyer: Arc<dyn Keyer>) -> Self {
        Self {
            inner: RwLock::new(Ledger::new(keyer)),
        }
    }
}

impl Storer for SyncStore {
    fn view<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        let ledger = self.inner.read().expect("lock poisoned");
        f(&ledger)
    }

    fn transact<R>(&self, f: impl FnOnce(&mut Ledger) -> R) -> R {
        let mut ledger = self.inner.write().expect("lock poisoned");
        f(&mut ledger)
    }
}

impl std::fmt::Debug for SyncStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncStore")
            .field("entry_count", &self.len())
            .finish()
    }
}
