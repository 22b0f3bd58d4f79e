//! Replicated key-value overlay for dhtkv.
//!
//! A [`ConnectedStore`] joins three collaborators: a [`Table`] that carries
//! requests to DHT responders, a [`Keyer`] that addresses values, and a
//! [`Storer`] ledger that remembers what this process published.
//!
//! Writes return as soon as the table accepts the request. A detached task
//! drains the responses and folds each one into the ledger in a single
//! transaction. Reads are local-first and fall back to the network, where
//! the first responder whose payload decodes wins. A [`KeepAlive`] loop
//! re-publishes every ledger entry on a fixed interval so values outlive
//! DHT expiry.
//!
//! [`Table`]: dhtkv_table::Table
//! [`Keyer`]: dhtkv_table::Keyer
//! [`Storer`]: dhtkv_store::Storer

pub mod config;
pub mod connected;
pub mod error;
pub mod keep_alive;

pub use config::StoreConfig;
pub use connected::ConnectedStore;
pub use error::{CoreError, CoreResult};
pub use keep_alive::{KeepAlive, KeepAliveState};
