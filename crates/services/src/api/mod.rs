//! Seams to the node: readiness listing, flip payloads and answer submission.

mod rpc;

use async_trait::async_trait;
use serde::Serialize;

use flip_core::model::{FlipHash, ReadinessRecord, ValidationStage};

use crate::error::ApiError;

pub use rpc::RpcClient;

/// One submitted answer in the shape the node expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
    pub hash: FlipHash,
    pub easy: bool,
    pub answer: u8,
}

#[async_trait]
pub trait ValidationApi: Send + Sync {
    /// Flips assigned to this node for `stage`, in authoritative order.
    ///
    /// An empty list means nothing has been assigned yet.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or node-side failure.
    async fn list_assigned(&self, stage: ValidationStage)
    -> Result<Vec<ReadinessRecord>, ApiError>;

    /// Submit the answers for `stage`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the node rejects the submission or cannot be reached.
    async fn submit_answers(
        &self,
        stage: ValidationStage,
        answers: &[AnswerRecord],
        nonce: u64,
        epoch: u64,
    ) -> Result<(), ApiError>;
}

#[async_trait]
pub trait FlipStore: Send + Sync {
    /// Hex-encoded payload for `hash`, `None` while it has not propagated yet.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` only for transport-level failures.
    async fn fetch_raw(&self, hash: &FlipHash) -> Result<Option<String>, ApiError>;
}
