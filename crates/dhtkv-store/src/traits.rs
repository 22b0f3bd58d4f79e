use std::collections::HashMap;

use dhtkv_types::{Cas, Key, NetworkError, Seq};

use crate::error::StoreResult;
use crate::ledger::Ledger;
use crate::value::StoreValue;

/// Synchronised access to a [`Ledger`].
///
/// Implementations must guarantee:
/// - `view` and `transact` see a consistent ledger for the whole closure.
/// - The closure passed to `transact` runs with exclusive access; the
///   effects of one transaction are never observed half-applied.
/// - Nested calls to `view`/`transact` from inside a closure are not
///   supported and may deadlock.
///
/// Every other method is a single-operation transaction built on these two.
pub trait Storer: Send + Sync {
    /// Run `f` with shared access to the ledger.
    fn view<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R;

    /// Run `f` with exclusive access to the ledger.
    fn transact<R>(&self, f: impl FnOnce(&mut Ledger) -> R) -> R;

    fn add(&self, name: &str, value: &str, wish: Option<usize>) -> StoreResult<Key> {
        self.transact(|ledger| ledger.add(name, value, wish))
    }

    fn get(&self, key: &Key) -> StoreResult<String> {
        self.view(|ledger| ledger.get(key))
    }

    fn remove(&self, key: &Key) -> StoreResult<()> {
        self.transact(|ledger| ledger.remove(key))
    }

    fn keys(&self) -> Vec<Key> {
        self.view(Ledger::keys)
    }

    fn values(&self) -> Vec<String> {
        self.view(Ledger::values)
    }

    fn map(&self) -> HashMap<Key, String> {
        self.view(Ledger::map)
    }

    fn stats(&self, keys: &[Key]) -> Vec<StoreValue> {
        self.view(|ledger| ledger.stats(keys))
    }

    fn stat(&self, key: &Key) -> Option<StoreValue> {
        self.view(|ledger| ledger.stat(key))
    }

    fn clear_stat(&self, key: &Key) -> bool {
        self.transact(|ledger| ledger.clear_stat(key))
    }

    fn update_replication_count(&self, key: &Key, delta: i64) -> usize {
        self.transact(|ledger| ledger.update_replication_count(key, delta))
    }

    fn update_seq(&self, key: &Key, seq: Seq) {
        self.transact(|ledger| ledger.update_seq(key, seq))
    }

    fn update_cas(&self, key: &Key, cas: Cas) {
        self.transact(|ledger| ledger.update_cas(key, cas))
    }

    fn add_err(&self, key: &Key, err: NetworkError) -> bool {
        self.transact(|ledger| ledger.add_err(key, err))
    }

    fn len(&self) -> usize {
        self.view(Ledger::len)
    }

    fn is_empty(&self) -> bool {
        self.view(Ledger::is_empty)
    }
}
