use dhtkv_store::StoreError;
use dhtkv_table::{DecodeError, KeyerError, TableError};
use dhtkv_types::NetworkError;

/// Errors surfaced by [`ConnectedStore`](crate::ConnectedStore) operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    /// The keyer could not derive a key or build a request.
    #[error("key derivation failed: {0}")]
    Keyer(#[from] KeyerError),

    /// The table rejected the request outright.
    #[error("submission rejected: {0}")]
    Submission(#[from] TableError),

    /// A responder reported a failure.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// A responder sent a payload that does not decode to a string.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// No cached value and no responder produced one.
    #[error("not found: {0}")]
    NotFound(String),

    /// A ledger operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for overlay operations.
pub type CoreResult<T> = Result<T, CoreError>;
