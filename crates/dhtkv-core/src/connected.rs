use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dhtkv_store::{StoreError, StoreValue, Storer};
use dhtkv_table::{Keyer, PayloadCodec, PutStream, Table};
use dhtkv_types::{Cas, Key, NetworkError, Seq};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::keep_alive::KeepAlive;

/// Sequence number of an unversioned first write.
const UNVERSIONED: Seq = -1;

/// Replicated key-value store on top of a DHT [`Table`].
///
/// Writes are fire-and-forget: `put` returns once the table accepts the
/// request, and a detached task folds each responder's answer into the
/// ledger. That task has no completion signal; its lifetime is the table's
/// response stream. Reads consult the ledger first and fall back to the
/// network.
pub struct ConnectedStore<S> {
    table: Arc<dyn Table>,
    keyer: Arc<dyn Keyer>,
    store: Arc<S>,
    config: StoreConfig,
}

impl<S> Clone for ConnectedStore<S> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            keyer: Arc::clone(&self.keyer),
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: Storer + 'static> ConnectedStore<S> {
    /// `store` should be keyed by the same keyer, or local lookups will miss.
    pub fn new(table: Arc<dyn Table>, keyer: Arc<dyn Keyer>, store: Arc<S>) -> Self {
        Self::with_config(table, keyer, store, StoreConfig::default())
    }

    pub fn with_config(
        table: Arc<dyn Table>,
        keyer: Arc<dyn Keyer>,
        store: Arc<S>,
        config: StoreConfig,
    ) -> Self {
        Self {
            table,
            keyer,
            store,
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// A re-publication loop over this store, initially stopped.
    pub fn keep_alive(&self, refresh: Duration) -> KeepAlive<S> {
        KeepAlive::new(self.clone(), refresh)
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Publish a new, unversioned value.
    pub async fn add(&self, name: &str, value: &str, copies: Option<usize>) -> CoreResult<Key> {
        self.put(name, value, UNVERSIONED, 0, copies).await
    }

    /// Publish the next version of `name`, one above the last sequence this
    /// ledger attempted for it and guarded by the last CAS token.
    pub async fn update(&self, name: &str, value: &str, copies: Option<usize>) -> CoreResult<Key> {
        let key = self.keyer.key(name, value)?;
        let (last_seq, last_cas) = self
            .store
            .stat(&key)
            .map_or((0, 0), |stat| (stat.last_seq, stat.last_cas));
        self.put(name, value, last_seq.max(0) + 1, last_cas, copies)
            .await
    }

    /// Submit `value` under `name` and return its key without waiting for
    /// any responder.
    ///
    /// Key derivation and submission failures are returned here. Responder
    /// outcomes land in the ledger later: errors on the entry's error list,
    /// acknowledgements as replication count plus the `seq`/`cas` used. Only
    /// an acknowledgement creates the entry or replaces its value, so a put
    /// that every responder rejects leaves no trace in a fresh ledger.
    pub async fn put(
        &self,
        name: &str,
        value: &str,
        seq: Seq,
        cas: Cas,
        copies: Option<usize>,
    ) -> CoreResult<Key> {
        let key = self.keyer.key(name, value)?;
        let mut request = self.keyer.put_message(name, value)?;
        request.set_seq(seq);
        request.set_cas(cas);

        let copies = copies.or(self.config.default_copies);
        let responses = self.table.put(request, copies).await?;
        debug!(key = %key.short_hex(), seq, cas, "put submitted");

        tokio::spawn(reconcile(
            Arc::clone(&self.store),
            responses,
            Reconcile {
                key,
                name: name.to_string(),
                value: value.to_string(),
                seq,
                cas,
                copies,
            },
        ));
        Ok(key)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Return the cached value for `lookup` if the ledger has one, else fetch.
    ///
    /// `lookup` is a hex key or, for mutable keyers, an item name.
    pub async fn get(&self, lookup: &str, seq: Option<Seq>, reads: Option<usize>) -> CoreResult<String> {
        if let Some(value) = self.cached(lookup) {
            debug!(lookup, "get served from ledger");
            return Ok(value);
        }
        self.fetch(lookup, seq, reads).await
    }

    /// Read `lookup` from the network. The first responder whose payload
    /// decodes wins.
    ///
    /// Waits in windows of `fetch_timeout`. A window that elapses after at
    /// least one error ends the read; so does the stream closing. Without a
    /// value, the first recorded error is returned, or
    /// [`CoreError::NotFound`] if there was none.
    pub async fn fetch(&self, lookup: &str, seq: Option<Seq>, reads: Option<usize>) -> CoreResult<String> {
        let mut request = self.keyer.get_message(lookup)?;
        if let Some(seq) = seq {
            request.set_seq(seq);
        }
        let target = request.target();
        let reads = reads.or(self.config.default_reads);
        let mut responses = self.table.get(request, reads).await?;

        let mut errors: Vec<CoreError> = Vec::new();
        loop {
            match tokio::time::timeout(self.config.fetch_timeout, responses.recv()).await {
                Ok(Some(Ok(payload))) => match PayloadCodec::decode_str(&payload.value) {
                    Ok(value) => {
                        debug!(key = %target.short_hex(), node = %payload.node, "fetch resolved");
                        return Ok(value);
                    }
                    Err(err) => {
                        debug!(key = %target.short_hex(), node = %payload.node, error = %err, "undecodable payload");
                        errors.push(err.into());
                    }
                },
                Ok(Some(Err(err))) => {
                    debug!(key = %target.short_hex(), error = %err, "responder failed");
                    errors.push(err.into());
                }
                Ok(None) => break,
                Err(_) if !errors.is_empty() => break,
                Err(_) => {}
            }
        }

        debug!(key = %target.short_hex(), errors = errors.len(), "fetch exhausted");
        Err(errors
            .into_iter()
            .next()
            .unwrap_or_else(|| CoreError::NotFound(lookup.to_string())))
    }

    fn cached(&self, lookup: &str) -> Option<String> {
        let by_key = Key::from_hex(lookup).ok();
        let by_name = self.keyer.resolve(lookup).ok();
        self.store.view(|ledger| {
            [by_key, by_name]
                .into_iter()
                .flatten()
                .find_map(|key| ledger.get(&key).ok())
        })
    }

    // -----------------------------------------------------------------------
    // Ledger pass-throughs
    // -----------------------------------------------------------------------

    pub fn remove(&self, key: &Key) -> CoreResult<()> {
        Ok(self.store.remove(key)?)
    }

    pub fn keys(&self) -> Vec<Key> {
        self.store.keys()
    }

    pub fn values(&self) -> Vec<String> {
        self.store.values()
    }

    pub fn map(&self) -> HashMap<Key, String> {
        self.store.map()
    }

    pub fn stats(&self, keys: &[Key]) -> Vec<StoreValue> {
        self.store.stats(keys)
    }

    pub fn stat(&self, key: &Key) -> Option<StoreValue> {
        self.store.stat(key)
    }

    pub fn clear_stat(&self, key: &Key) -> bool {
        self.store.clear_stat(key)
    }
}

impl<S> std::fmt::Debug for ConnectedStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectedStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// What a put attempted, applied to the ledger once per response.
struct Reconcile {
    key: Key,
    name: String,
    value: String,
    seq: Seq,
    cas: Cas,
    copies: Option<usize>,
}

async fn reconcile<S: Storer>(store: Arc<S>, mut responses: PutStream, put: Reconcile) {
    let mut acked = 0usize;
    let mut failed = 0usize;
    // Rejections seen while the ledger has no entry for the key yet.
    let mut pending: Vec<NetworkError> = Vec::new();
    while let Some(outcome) = responses.recv().await {
        store.transact(|ledger| match outcome {
            Ok(()) => {
                match ledger.add(&put.name, &put.value, put.copies) {
                    Ok(_) | Err(StoreError::AlreadyPresent(_)) => {}
                    Err(err) => {
                        warn!(key = %put.key.short_hex(), error = %err, "could not record put response");
                        return;
                    }
                }
                for err in pending.drain(..) {
                    ledger.add_err(&put.key, err);
                }
                ledger.update_value(&put.key, &put.value);
                ledger.update_replication_count(&put.key, 1);
                ledger.update_seq(&put.key, put.seq);
                ledger.update_cas(&put.key, put.cas);
                acked += 1;
            }
            Err(err) => {
                debug!(key = %put.key.short_hex(), error = %err, "put rejected by responder");
                if ledger.contains(&put.key) {
                    ledger.add_err(&put.key, err);
                } else {
                    pending.push(err);
                }
                failed += 1;
            }
        });
    }
    if !pending.is_empty() {
        debug!(key = %put.key.short_hex(), rejected = pending.len(), "put never acknowledged; ledger untouched");
    }
    debug!(key = %put.key.short_hex(), acked, failed, "put round drained");
}
