use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a single responder during a put or get round.
///
/// These arrive asynchronously on a response stream. For puts they are
/// recorded in the ledger entry of the key; for gets the first one is
/// surfaced when no responder produced a value.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{node}: {message}")]
pub struct NetworkError {
    /// Identifier of the responding node.
    pub node: String,
    /// Protocol error code, when the responder sent one.
    pub code: Option<i64>,
    /// Human readable reason.
    pub message: String,
}

impl NetworkError {
    pub fn new(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(node: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            code: Some(code),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_node() {
        let err = NetworkError::new("node-3", "timed out");
        assert_eq!(err.to_string(), "node-3: timed out");
        assert!(err.code.is_none());
    }

    #[test]
    fn with_code_keeps_code() {
        let err = NetworkError::with_code("node-1", 302, "sequence number less than current");
        assert_eq!(err.code, Some(302));
    }
}
