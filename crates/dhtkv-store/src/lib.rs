//! Local replication ledger for dhtkv.
//!
//! The ledger maps every key this process has published to a [`StoreValue`]:
//! the value, how many responders acknowledged it since the last reset, the
//! last sequence number and CAS token attempted, and the responder errors
//! collected along the way.
//!
//! # Design Rules
//!
//! 1. One entry per derived key, created by `add`, removed only by `remove`.
//! 2. Replication counts never go below zero.
//! 3. Errors accumulate until `clear_stat`.
//! 4. All mutation goes through [`Storer::transact`]; the effects of one
//!    closure are never observed half-applied.
//! 5. The ledger lives in memory only.

pub mod error;
pub mod ledger;
pub mod sync;
pub mod traits;
pub mod value;

pub use error::{StoreError, StoreResult};
pub use ledger::Ledger;
pub use sync::SyncStore;
pub use traits::Storer;
pub use value::StoreValue;
