use dhtkv_types::{Key, TypeError};
use thiserror::Error;

/// A request rejected by the table at submission time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("replica count must be at least 1")]
    ZeroReplicas,

    #[error("signature does not verify for target {target}")]
    InvalidSignature { target: Key },

    #[error("value of {size} bytes exceeds the {max} byte limit")]
    ValueTooLarge { size: usize, max: usize },
}

/// Result alias for table submissions.
pub type TableResult<T> = Result<T, TableError>;

/// A keyer could not derive a key or build a request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyerError {
    #[error("qualified name of {len} bytes exceeds the {max} byte limit")]
    NameTooLong { len: usize, max: usize },

    #[error("encoded value of {size} bytes exceeds the {max} byte limit")]
    ValueTooLarge { size: usize, max: usize },

    #[error("invalid lookup key: {0}")]
    InvalidLookup(#[from] TypeError),
}

/// Result alias for keyer operations.
pub type KeyerResult<T> = Result<T, KeyerError>;

/// A received payload is not valid encoded data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("payload is not a byte string: {0}")]
    NotAString(String),

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
}

impl From<serde_bencode::Error> for DecodeError {
    fn from(err: serde_bencode::Error) -> Self {
        match err {
            serde_bencode::Error::InvalidType(msg) => DecodeError::NotAString(msg),
            other => DecodeError::Malformed(other.to_string()),
        }
    }
}
