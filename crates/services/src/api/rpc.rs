use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use flip_core::model::{FlipHash, ReadinessRecord, ValidationStage};

use super::{AnswerRecord, FlipStore, ValidationApi};
use crate::config::ValidationConfig;
use crate::error::ApiError;

/// JSON-RPC client for the node's flip and validation methods.
pub struct RpcClient {
    client: Client,
    url: String,
    api_key: Option<String>,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Build a client from the connection settings.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be constructed.
    pub fn new(config: &ValidationConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            url: config.node_url.clone(),
            api_key: config.api_key.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn call<P, R>(&self, method: &'static str, params: P) -> Result<RpcResponse<R>, ApiError>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let request = RpcRequest {
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            key: self.api_key.as_deref(),
        };

        let response = self.client.post(&self.url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ValidationApi for RpcClient {
    async fn list_assigned(
        &self,
        stage: ValidationStage,
    ) -> Result<Vec<ReadinessRecord>, ApiError> {
        let response: RpcResponse<Vec<HashEntry>> =
            self.call(stage.hashes_method(), [(); 0]).await?;
        readiness_from_response(response)
    }

    async fn submit_answers(
        &self,
        stage: ValidationStage,
        answers: &[AnswerRecord],
        nonce: u64,
        epoch: u64,
    ) -> Result<(), ApiError> {
        let params = [SubmitParams {
            answers,
            nonce,
            epoch,
        }];
        let response: RpcResponse<serde_json::Value> =
            self.call(stage.submit_method(), params).await?;
        if let Some(error) = response.error {
            return Err(ApiError::Rpc(error.message));
        }
        Ok(())
    }
}

#[async_trait]
impl FlipStore for RpcClient {
    async fn fetch_raw(&self, hash: &FlipHash) -> Result<Option<String>, ApiError> {
        let response: RpcResponse<FlipBody> = self.call("flip_get", [hash]).await?;
        Ok(hex_from_response(hash, response))
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P> {
    method: &'static str,
    params: P,
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct HashEntry {
    hash: FlipHash,
    #[serde(default)]
    ready: bool,
}

#[derive(Debug, Deserialize)]
struct FlipBody {
    hex: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubmitParams<'a> {
    answers: &'a [AnswerRecord],
    nonce: u64,
    epoch: u64,
}

fn readiness_from_response(
    response: RpcResponse<Vec<HashEntry>>,
) -> Result<Vec<ReadinessRecord>, ApiError> {
    if let Some(error) = response.error {
        return Err(ApiError::Rpc(error.message));
    }
    Ok(response
        .result
        .unwrap_or_default()
        .into_iter()
        .map(|entry| ReadinessRecord::new(entry.hash, entry.ready))
        .collect())
}

// A node that has no data for the flip yet answers with an error object; that is
// the normal "not propagated" case, not a failure.
fn hex_from_response(hash: &FlipHash, response: RpcResponse<FlipBody>) -> Option<String> {
    if let Some(error) = response.error {
        debug!(flip = %hash.short(), reason = %error.message, "flip payload not available yet");
        return None;
    }
    response
        .result
        .and_then(|body| body.hex)
        .filter(|hex| !hex.is_empty())
}
