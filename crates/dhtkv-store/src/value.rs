use chrono::{DateTime, Utc};
use dhtkv_types::{Cas, NetworkError, Seq};
use serde::{Deserialize, Serialize};

/// Ledger entry for one key.
///
/// `last_seq` / `last_cas` record the version most recently attempted, not
/// one a quorum accepted. `replication_count` counts acknowledgements since
/// the last `clear_stat`, not a live replication factor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreValue {
    pub value: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub wish_replication_count: usize,
    pub replication_count: usize,
    pub last_seq: Seq,
    pub last_cas: Cas,
    pub errors: Vec<NetworkError>,
}

impl StoreValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>, wish: usize) -> Self {
        let now = Utc::now();
        Self {
            value: value.into(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            wish_replication_count: wish,
            replication_count: 0,
            last_seq: 0,
            last_cas: 0,
            errors: Vec::new(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Reset the per-round statistics, keeping value and version.
    pub fn clear_stat(&mut self) {
        self.errors.clear();
        self.replication_count = 0;
        self.touch();
    }

    /// Add `delta` to the replication count, clamping at zero.
    pub fn adjust_replication(&mut self, delta: i64) -> usize {
        let current = i64::try_from(self.replication_count).unwrap_or(i64::MAX);
        let next = current.saturating_add(delta).max(0);
        self.replication_count = usize::try_from(next).unwrap_or(usize::MAX);
        self.touch();
        self.replication_count
    }

    /// Replace the cached value. Returns `true` if it changed.
    pub fn set_value(&mut self, value: &str) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value.to_string();
        self.touch();
        true
    }

    pub fn set_seq(&mut self, seq: Seq) {
        self.last_seq = seq;
        self.touch();
    }

    pub fn set_cas(&mut self, cas: Cas) {
        self.last_cas = cas;
        self.touch();
    }

    pub fn push_error(&mut self, err: NetworkError) {
        self.errors.push(err);
        self.touch();
    }

    /// Whether the last round reached the wished replication count.
    pub fn is_replicated(&self) -> bool {
        self.replication_count >= self.wish_replication_count.max(1)
    }
}
