//! DHT table seam for dhtkv.
//!
//! The overlay never talks to the network directly. It consumes a narrow
//! [`Table`] capability: submit a put or get request to some number of
//! responders and receive their outcomes on a stream that closes when the
//! round ends.
//!
//! # Contents
//!
//! - [`Keyer`] — derives keys and builds requests for one addressing mode
//!   ([`ImmutableKeyer`] for content-addressed items, [`MutableKeyer`] for
//!   owner-signed, versioned items)
//! - [`PutRequest`] / [`GetRequest`] — requests with optional sequence/CAS capabilities
//! - [`PayloadCodec`] — encoding of values exchanged with responders
//! - [`MemoryTable`] — in-process simulated network implementing [`Table`]

pub mod codec;
pub mod error;
pub mod keyer;
pub mod memory;
pub mod request;
pub mod table;

pub use codec::PayloadCodec;
pub use error::{DecodeError, KeyerError, KeyerResult, TableError, TableResult};
pub use keyer::{ImmutableKeyer, Keyer, MutableKeyer, MAX_SALT_LEN, MAX_VALUE_LEN};
pub use memory::{MemoryTable, NodeBehavior, TableConfig, CODE_CAS_MISMATCH, CODE_SEQ_TOO_LOW};
pub use request::{GetRequest, ImmutablePut, MutableGet, MutablePut, PutRequest};
pub use table::{GetOutcome, GetPayload, GetStream, PutOutcome, PutStream, Table};
