use std::collections::HashMap;
use std::sync::Arc;

use dhtkv_table::Keyer;
use dhtkv_types::{Cas, Key, NetworkError, Seq};

use crate::error::{StoreError, StoreResult};
use crate::value::StoreValue;

/// Unsynchronised key → [`StoreValue`] mapping.
///
/// Callers outside this crate reach it through [`Storer`](crate::Storer),
/// which wraps every access in a lock. Operations on a missing key are
/// no-ops that report the miss through their return value.
pub struct Ledger {
    keyer: Arc<dyn Keyer>,
    local: HashMap<Key, StoreValue>,
}

impl Ledger {
    pub fn new(keyer: Arc<dyn Keyer>) -> Self {
        Self {
            keyer,
            local: HashMap::new(),
        }
    }

    /// Insert a fresh entry for `(name, value)` and return its key.
    ///
    /// Fails with [`StoreError::AlreadyPresent`] if the key has an entry.
    pub fn add(&mut self, name: &str, value: &str, wish: Option<usize>) -> StoreResult<Key> {
        let key = self.keyer.key(name, value)?;
        if self.local.contains_key(&key) {
            return Err(StoreError::AlreadyPresent(key));
        }
        self.local
            .insert(key, StoreValue::new(name, value, wish.unwrap_or(0)));
        Ok(key)
    }

    pub fn get(&self, key: &Key) -> StoreResult<String> {
        self.local
            .get(key)
            .map(|entry| entry.value.clone())
            .ok_or(StoreError::NotFound(*key))
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.local.contains_key(key)
    }

    pub fn remove(&mut self, key: &Key) -> StoreResult<()> {
        self.local
            .remove(key)
            .map(|_| ())
            .ok_or(StoreError::NotFound(*key))
    }

    pub fn keys(&self) -> Vec<Key> {
        self.local.keys().copied().collect()
    }

    pub fn values(&self) -> Vec<String> {
        self.local.values().map(|entry| entry.value.clone()).collect()
    }

    pub fn map(&self) -> HashMap<Key, String> {
        self.local
            .iter()
            .map(|(key, entry)| (*key, entry.value.clone()))
            .collect()
    }

    /// Entries for `keys`, or every entry when `keys` is empty.
    pub fn stats(&self, keys: &[Key]) -> Vec<StoreValue> {
        if keys.is_empty() {
            return self.local.values().cloned().collect();
        }
        self.local
            .iter()
            .filter(|(key, _)| keys.contains(key))
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    pub fn stat(&self, key: &Key) -> Option<StoreValue> {
        self.local.get(key).cloned()
    }

    /// Reset errors and replication count. Returns `false` if the key is absent.
    pub fn clear_stat(&mut self, key: &Key) -> bool {
        match self.local.get_mut(key) {
            Some(entry) => {
                entry.clear_stat();
                true
            }
            None => false,
        }
    }

    /// Add `delta` to the replication count, clamped at zero. Returns the new
    /// count, or 0 if the key is absent.
    pub fn update_replication_count(&mut self, key: &Key, delta: i64) -> usize {
        self.local
            .get_mut(key)
            .map_or(0, |entry| entry.adjust_replication(delta))
    }

    /// Replace the cached value of an existing entry. Returns `false` if the
    /// key is absent or the value is unchanged.
    pub fn update_value(&mut self, key: &Key, value: &str) -> bool {
        self.local
            .get_mut(key)
            .is_some_and(|entry| entry.set_value(value))
    }

    pub fn update_seq(&mut self, key: &Key, seq: Seq) {
        if let Some(entry) = self.local.get_mut(key) {
            entry.set_seq(seq);
        }
    }

    pub fn update_cas(&mut self, key: &Key, cas: Cas) {
        if let Some(entry) = self.local.get_mut(key) {
            entry.set_cas(cas);
        }
    }

    /// Append a responder error. Returns `false` if the key is absent.
    pub fn add_err(&mut self, key: &Key, err: NetworkError) -> bool {
        match self.local.get_mut(key) {
            Some(entry) => {
                entry.push_error(err);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty()
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("entry_count", &self.local.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dhtkv_crypto::Identity;
    use dhtkv_table::{ImmutableKeyer, KeyerError, MutableKeyer};

    fn immutable() -> Ledger {
        Ledger::new(Arc::new(ImmutableKeyer))
    }

    fn err(node: &str) -> NetworkError {
        NetworkError::new(node, "unreachable")
    }

    // -----------------------------------------------------------------------
    // Add / Get / Remove
    // -----------------------------------------------------------------------

    #[test]
    fn add_creates_fresh_entry() {
        let mut ledger = immutable();
        let key = ledger.add("alice", "v1", Some(3)).unwrap();
        let stat = ledger.stat(&key).unwrap();
        assert_eq!(stat.value, "v1");
        assert_eq!(stat.name, "alice");
        assert_eq!(stat.wish_replication_count, 3);
        assert_eq!(stat.replication_count, 0);
        assert!(stat.errors.is_empty());
        assert_eq!(stat.created_at, stat.updated_at);
        assert_eq!(ledger.get(&key).unwrap(), "v1");
    }

    #[test]
    fn add_twice_is_already_present() {
        let mut ledger = immutable();
        let key = ledger.add("a", "same", None).unwrap();
        assert_eq!(
            ledger.add("b", "same", None),
            Err(StoreError::AlreadyPresent(key))
        );
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn add_propagates_keyer_errors() {
        let keyer = MutableKeyer::new(Identity::generate("alice", ""));
        let mut ledger = Ledger::new(Arc::new(keyer));
        let name = "x".repeat(100);
        assert!(matches!(
            ledger.add(&name, "v", None),
            Err(StoreError::Keyer(KeyerError::NameTooLong { .. }))
        ));
    }

    #[test]
    fn mutable_add_keys_by_name() {
        let keyer = MutableKeyer::new(Identity::generate("alice", ""));
        let mut ledger = Ledger::new(Arc::new(keyer));
        let key = ledger.add("profile", "v1", None).unwrap();
        assert_eq!(
            ledger.add("profile", "v2", None),
            Err(StoreError::AlreadyPresent(key))
        );
    }

    #[test]
    fn get_missing_is_not_found() {
        let ledger = immutable();
        let key = Key::from_hash([1; 32]);
        assert_eq!(ledger.get(&key), Err(StoreError::NotFound(key)));
    }

    #[test]
    fn remove_present_and_missing() {
        let mut ledger = immutable();
        let key = ledger.add("a", "v", None).unwrap();
        assert!(ledger.remove(&key).is_ok());
        assert!(!ledger.contains(&key));
        assert_eq!(ledger.remove(&key), Err(StoreError::NotFound(key)));
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    #[test]
    fn keys_values_and_map_agree() {
        let mut ledger = immutable();
        let k1 = ledger.add("a", "one", None).unwrap();
        let k2 = ledger.add("b", "two", None).unwrap();

        let mut keys = ledger.keys();
        keys.sort();
        let mut expected = vec![k1, k2];
        expected.sort();
        assert_eq!(keys, expected);

        let mut values = ledger.values();
        values.sort();
        assert_eq!(values, vec!["one".to_string(), "two".to_string()]);

        let map = ledger.map();
        assert_eq!(map[&k1], "one");
        assert_eq!(map[&k2], "two");
    }

    #[test]
    fn stats_without_keys_returns_all() {
        let mut ledger = immutable();
        ledger.add("a", "one", None).unwrap();
        ledger.add("b", "two", None).unwrap();
        assert_eq!(ledger.stats(&[]).len(), 2);
    }

    #[test]
    fn stats_filters_by_key() {
        let mut ledger = immutable();
        let k1 = ledger.add("a", "one", None).unwrap();
        ledger.add("b", "two", None).unwrap();
        let unknown = Key::from_hash([9; 32]);
        let stats = ledger.stats(&[k1, unknown]);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].value, "one");
    }

    // -----------------------------------------------------------------------
    // Replication accounting
    // -----------------------------------------------------------------------

    #[test]
    fn replication_count_clamps_at_zero() {
        let mut ledger = immutable();
        let key = ledger.add("a", "v", None).unwrap();
        assert_eq!(ledger.update_replication_count(&key, 2), 2);
        assert_eq!(ledger.update_replication_count(&key, -5), 0);
        assert_eq!(ledger.stat(&key).unwrap().replication_count, 0);
    }

    #[test]
    fn replication_count_on_missing_key_is_zero() {
        let mut ledger = immutable();
        assert_eq!(
            ledger.update_replication_count(&Key::from_hash([0; 32]), 4),
            0
        );
    }

    #[test]
    fn seq_and_cas_overwrite() {
        let mut ledger = immutable();
        let key = ledger.add("a", "v", None).unwrap();
        ledger.update_seq(&key, 4);
        ledger.update_cas(&key, 3);
        ledger.update_seq(&key, 2);
        let stat = ledger.stat(&key).unwrap();
        assert_eq!(stat.last_seq, 2);
        assert_eq!(stat.last_cas, 3);
    }

    #[test]
    fn update_value_replaces_cached_value() {
        let keyer = MutableKeyer::new(Identity::generate("alice", ""));
        let mut ledger = Ledger::new(Arc::new(keyer));
        let key = ledger.add("profile", "v1", None).unwrap();
        assert!(ledger.update_value(&key, "v2"));
        assert!(!ledger.update_value(&key, "v2"));
        assert_eq!(ledger.get(&key).unwrap(), "v2");
        assert!(!ledger.update_value(&Key::from_hash([0; 32]), "v3"));
    }

    #[test]
    fn add_err_only_for_known_keys() {
        let mut ledger = immutable();
        let key = ledger.add("a", "v", None).unwrap();
        assert!(ledger.add_err(&key, err("node-1")));
        assert!(ledger.add_err(&key, err("node-2")));
        assert!(!ledger.add_err(&Key::from_hash([0; 32]), err("node-3")));
        assert_eq!(ledger.stat(&key).unwrap().errors.len(), 2);
    }

    #[test]
    fn clear_stat_resets_round_but_keeps_version() {
        let mut ledger = immutable();
        let key = ledger.add("a", "v", None).unwrap();
        ledger.update_replication_count(&key, 3);
        ledger.update_seq(&key, 5);
        ledger.update_cas(&key, 4);
        ledger.add_err(&key, err("node-1"));

        assert!(ledger.clear_stat(&key));
        let stat = ledger.stat(&key).unwrap();
        assert_eq!(stat.replication_count, 0);
        assert!(stat.errors.is_empty());
        assert_eq!(stat.value, "v");
        assert_eq!(stat.name, "a");
        assert_eq!(stat.last_seq, 5);
        assert_eq!(stat.last_cas, 4);
    }

    #[test]
    fn clear_stat_missing_key() {
        let mut ledger = immutable();
        assert!(!ledger.clear_stat(&Key::from_hash([0; 32])));
    }
}
