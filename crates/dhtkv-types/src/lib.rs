//! Foundation types for dhtkv, a replicated key-value overlay on a DHT.
//!
//! Every other dhtkv crate depends on `dhtkv-types`.
//!
//! # Key Types
//!
//! - [`Key`] — 32-byte lookup key derived by a keyer
//! - [`NetworkError`] — failure reported by one responder during a put/get round
//! - [`Seq`] / [`Cas`] — version counter and compare-and-swap token of a mutable item

pub mod error;
pub mod key;
pub mod millis;
pub mod network;

pub use error::TypeError;
pub use key::Key;
pub use network::NetworkError;

/// Monotonic version counter of a mutable item. `-1` marks an unversioned write.
pub type Seq = i64;

/// Compare-and-swap token sent along with a mutable write. `0` disables the check.
pub type Cas = i64;
