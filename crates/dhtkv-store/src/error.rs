use dhtkv_table::KeyerError;
use dhtkv_types::Key;

/// Errors from ledger operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// No entry exists for the key.
    #[error("key not found: {0}")]
    NotFound(Key),

    /// `add` was called for a key that already has an entry.
    #[error("key already present: {0}")]
    AlreadyPresent(Key),

    /// The keyer could not derive a key for the entry.
    #[error("key derivation failed: {0}")]
    Keyer(#[from] KeyerError),
}

/// Result alias for ledger operations.
pub type StoreResult<T> = Result<T, StoreError>;
