use async_trait::async_trait;
use dhtkv_types::{NetworkError, Seq};
use tokio::sync::mpsc;

use crate::error::TableResult;
use crate::request::{GetRequest, PutRequest};

/// A value returned by one responder, still in its wire encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetPayload {
    pub node: String,
    pub value: Vec<u8>,
    pub seq: Option<Seq>,
}

/// Outcome reported by one responder to a put.
pub type PutOutcome = Result<(), NetworkError>;

/// Outcome reported by one responder to a get.
pub type GetOutcome = Result<GetPayload, NetworkError>;

/// Responses to a put; closed when the distribution round ends.
pub type PutStream = mpsc::Receiver<PutOutcome>;

/// Responses to a get; closed when the lookup round ends.
pub type GetStream = mpsc::Receiver<GetOutcome>;

/// Network transport that distributes requests across DHT responders.
///
/// `None` for the replica/responder count selects the table's default
/// fan-out. An `Err` means the request was rejected outright; per-responder
/// failures arrive later on the stream.
#[async_trait]
pub trait Table: Send + Sync {
    async fn put(&self, request: PutRequest, replicas: Option<usize>) -> TableResult<PutStream>;
    async fn get(&self, request: GetRequest, responders: Option<usize>) -> TableResult<GetStream>;
}
