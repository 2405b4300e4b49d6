use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, warn};

use flip_core::model::{DecodedFlip, FlipHash};

use crate::api::FlipStore;
use crate::error::ApiError;

/// Raw flip payload bytes, hex-decoded.
pub type RawPayload = Vec<u8>;

/// Strip the optional `0x` prefix and hex-decode a payload.
///
/// # Errors
///
/// Returns `hex::FromHexError` for odd-length or non-hex input.
pub fn decode_hex_payload(raw: &str) -> Result<RawPayload, hex::FromHexError> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    hex::decode(digits)
}

/// Retrieves flip payloads from the content store.
#[derive(Clone)]
pub struct FlipFetcher {
    store: Arc<dyn FlipStore>,
}

impl FlipFetcher {
    #[must_use]
    pub fn new(store: Arc<dyn FlipStore>) -> Self {
        Self { store }
    }

    /// Fetch one payload. Absent or unreadable payloads come back as `None`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the store cannot be reached.
    pub async fn fetch(&self, hash: &FlipHash) -> Result<Option<RawPayload>, ApiError> {
        let Some(raw) = self.store.fetch_raw(hash).await? else {
            debug!(flip = %hash.short(), "flip payload absent");
            return Ok(None);
        };
        match decode_hex_payload(&raw) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) => {
                warn!(flip = %hash.short(), error = %err, "discarding payload with invalid hex");
                Ok(None)
            }
        }
    }

    /// Fetch every hash concurrently; results line up with `hashes`.
    ///
    /// # Errors
    ///
    /// Returns the first `ApiError` if any fetch fails at the transport level.
    pub async fn fetch_batch(
        &self,
        hashes: &[FlipHash],
    ) -> Result<Vec<Option<RawPayload>>, ApiError> {
        try_join_all(hashes.iter().map(|hash| self.fetch(hash))).await
    }

    /// Fetch and decode every hash; payloads that fail to decode read as absent.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if any fetch fails at the transport level.
    pub async fn fetch_decoded(
        &self,
        hashes: &[FlipHash],
    ) -> Result<Vec<Option<DecodedFlip>>, ApiError> {
        let payloads = self.fetch_batch(hashes).await?;
        Ok(hashes
            .iter()
            .zip(payloads)
            .map(|(hash, payload)| {
                let payload = payload?;
                DecodedFlip::from_payload(&payload)
                    .inspect_err(|err| {
                        warn!(flip = %hash.short(), error = %err, "discarding undecodable flip");
                    })
                    .ok()
            })
            .collect())
    }
}
