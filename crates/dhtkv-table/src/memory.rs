use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use dhtkv_crypto::KeyHasher;
use dhtkv_types::{Cas, Key, NetworkError, Seq};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{TableError, TableResult};
use crate::keyer::MAX_VALUE_LEN;
use crate::request::{GetRequest, PutRequest};
use crate::table::{GetOutcome, GetPayload, GetStream, PutOutcome, PutStream, Table};

/// Error code for a CAS token that does not match the stored sequence.
pub const CODE_CAS_MISMATCH: i64 = 301;

/// Error code for a sequence number below the stored one.
pub const CODE_SEQ_TOO_LOW: i64 = 302;

/// Configuration for the [`MemoryTable`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Fan-out used when a caller does not name one.
    pub default_replicas: usize,
    /// Buffer of each response stream.
    pub channel_capacity: usize,
    /// Delay before each responder answers.
    #[serde(with = "dhtkv_types::millis")]
    pub latency: Duration,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            default_replicas: 8,
            channel_capacity: 64,
            latency: Duration::ZERO,
        }
    }
}

/// How a simulated node answers requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeBehavior {
    #[default]
    Online,
    /// Every request fails with a network error.
    Offline,
    /// Acknowledges puts without storing and answers gets with garbage.
    Corrupt,
}

#[derive(Clone, Debug)]
struct StoredItem {
    encoded: Vec<u8>,
    seq: Option<Seq>,
}

struct SimNode {
    id: Key,
    label: String,
    behavior: RwLock<NodeBehavior>,
    items: RwLock<HashMap<Key, StoredItem>>,
}

impl SimNode {
    fn new(index: usize) -> Self {
        let label = format!("node-{index}");
        Self {
            id: KeyHasher::NODE.hash(label.as_bytes()),
            label,
            behavior: RwLock::new(NodeBehavior::Online),
            items: RwLock::new(HashMap::new()),
        }
    }

    fn behavior(&self) -> NodeBehavior {
        *self.behavior.read().expect("node lock poisoned")
    }

    fn store(&self, target: Key, item: StoredItem, cas: Cas) -> PutOutcome {
        match self.behavior() {
            NodeBehavior::Offline => return Err(NetworkError::new(&self.label, "node unreachable")),
            NodeBehavior::Corrupt => return Ok(()),
            NodeBehavior::Online => {}
        }
        let mut items = self.items.write().expect("node lock poisoned");
        if let (Some(existing), Some(seq)) = (items.get(&target), item.seq) {
            if cas != 0 && existing.seq != Some(cas) {
                return Err(NetworkError::with_code(
                    &self.label,
                    CODE_CAS_MISMATCH,
                    "CAS mismatch, re-read value and try again",
                ));
            }
            if existing.seq.is_some_and(|current| seq < current) {
                return Err(NetworkError::with_code(
                    &self.label,
                    CODE_SEQ_TOO_LOW,
                    "sequence number less than current",
                ));
            }
        }
        items.insert(target, item);
        Ok(())
    }

    /// `None` when the node holds nothing worth answering with.
    fn lookup(&self, target: &Key, min_seq: Option<Seq>) -> Option<GetOutcome> {
        match self.behavior() {
            NodeBehavior::Offline => {
                Some(Err(NetworkError::new(&self.label, "node unreachable")))
            }
            NodeBehavior::Corrupt => Some(Ok(GetPayload {
                node: self.label.clone(),
                value: b"corrupt".to_vec(),
                seq: None,
            })),
            NodeBehavior::Online => {
                let items = self.items.read().expect("node lock poisoned");
                items
                    .get(target)
                    .filter(|item| match (min_seq, item.seq) {
                        (Some(min), Some(seq)) => seq >= min,
                        _ => true,
                    })
                    .map(|item| {
                        Ok(GetPayload {
                            node: self.label.clone(),
                            value: item.encoded.clone(),
                            seq: item.seq,
                        })
                    })
            }
        }
    }
}

/// In-process simulated DHT for tests, demos, and embedding.
///
/// Holds a fixed set of nodes. Each round addresses the nodes closest to the
/// target by XOR distance and answers from a spawned task, one response per
/// addressed node, then closes the stream. Requires a tokio runtime.
pub struct MemoryTable {
    nodes: Arc<Vec<SimNode>>,
    config: TableConfig,
}

impl MemoryTable {
    pub fn new(node_count: usize, config: TableConfig) -> Self {
        Self {
            nodes: Arc::new((0..node_count).map(SimNode::new).collect()),
            config,
        }
    }

    /// A network of `node_count` nodes with the default configuration.
    pub fn with_nodes(node_count: usize) -> Self {
        Self::new(node_count, TableConfig::default())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Change how node `index` answers. Returns `false` for an unknown node.
    pub fn set_behavior(&self, index: usize, behavior: NodeBehavior) -> bool {
        match self.nodes.get(index) {
            Some(node) => {
                *node.behavior.write().expect("node lock poisoned") = behavior;
                true
            }
            None => false,
        }
    }

    /// Indices of the `n` nodes closest to `target`, nearest first.
    pub fn closest(&self, target: &Key, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.nodes.len()).collect();
        indices.sort_by_key(|&i| self.nodes[i].id.distance(target));
        indices.truncate(n);
        indices
    }

    /// Number of nodes currently storing `target`.
    pub fn holders(&self, target: &Key) -> usize {
        self.nodes
            .iter()
            .filter(|node| {
                node.items
                    .read()
                    .expect("node lock poisoned")
                    .contains_key(target)
            })
            .count()
    }

    /// Drop every stored item, as if all entries timed out.
    pub fn expire_all(&self) {
        for node in self.nodes.iter() {
            node.items.write().expect("node lock poisoned").clear();
        }
    }

    fn fan_out(&self, replicas: Option<usize>) -> TableResult<usize> {
        match replicas.unwrap_or(self.config.default_replicas) {
            0 => Err(TableError::ZeroReplicas),
            n => Ok(n),
        }
    }
}

impl std::fmt::Debug for MemoryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTable")
            .field("node_count", &self.nodes.len())
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl Table for MemoryTable {
    async fn put(&self, request: PutRequest, replicas: Option<usize>) -> TableResult<PutStream> {
        let replicas = self.fan_out(replicas)?;
        let target = request.target();
        let encoded = request.encoded_value();
        if encoded.len() > MAX_VALUE_LEN {
            return Err(TableError::ValueTooLarge {
                size: encoded.len(),
                max: MAX_VALUE_LEN,
            });
        }
        if let PutRequest::Mutable(put) = &request {
            put.verify()
                .map_err(|_| TableError::InvalidSignature { target })?;
        }

        let item = StoredItem {
            encoded,
            seq: request.seq(),
        };
        let cas = request.cas().unwrap_or(0);
        let addressed = self.closest(&target, replicas);
        debug!(target = %target.short_hex(), replicas = addressed.len(), "put round started");

        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let nodes = Arc::clone(&self.nodes);
        let latency = self.config.latency;
        tokio::spawn(async move {
            for index in addressed {
                if !latency.is_zero() {
                    tokio::time::sleep(latency).await;
                }
                let outcome = nodes[index].store(target, item.clone(), cas);
                if tx.send(outcome).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }

    async fn get(&self, request: GetRequest, responders: Option<usize>) -> TableResult<GetStream> {
        let responders = self.fan_out(responders)?;
        let target = request.target();
        let min_seq = request.min_seq();
        let addressed = self.closest(&target, responders);
        debug!(target = %target.short_hex(), responders = addressed.len(), "get round started");

        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let nodes = Arc::clone(&self.nodes);
        let latency = self.config.latency;
        tokio::spawn(async move {
            for index in addressed {
                if !latency.is_zero() {
                    tokio::time::sleep(latency).await;
                }
                let Some(outcome) = nodes[index].lookup(&target, min_seq) else {
                    continue;
                };
                if tx.send(outcome).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}
