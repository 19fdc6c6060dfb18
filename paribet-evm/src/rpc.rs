//! JSON-RPC transport.
//!
//! A deliberately small client: the event source needs exactly three
//! methods (`eth_getLogs`, `eth_getBlockByNumber`, `eth_blockNumber`), so
//! this speaks the protocol directly instead of pulling in a provider
//! stack. Transport and provider-side failures map to
//! [`SourceError::Unavailable`]; shape problems inside an otherwise valid
//! response are left to the decoding layer.

use paribet_core::source::SourceError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

/// Minimal JSON-RPC 2.0 client over HTTP.
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: Url,
    next_id: AtomicU64,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl RpcClient {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            endpoint,
            next_id: AtomicU64::new(1),
        }
    }

    /// Issue one JSON-RPC call.
    pub async fn call<P: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<T, SourceError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("{method} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!(
                "{method} returned HTTP {status}"
            )));
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| SourceError::Unavailable(format!("{method} response body: {e}")))?;

        if let Some(error) = body.error {
            return Err(SourceError::Unavailable(format!(
                "{method} RPC error {}: {}",
                error.code, error.message
            )));
        }

        body.result.ok_or_else(|| {
            SourceError::Unavailable(format!("{method} response carried neither result nor error"))
        })
    }
}

/// `eth_getLogs` filter object.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilterParams {
    pub from_block: String,
    pub to_block: String,
    pub address: String,
    /// `[topic0, player]`: the event signature and the indexed account.
    pub topics: Vec<Option<String>>,
}

/// A log entry as returned by `eth_getLogs`.
///
/// Quantities stay as hex strings here; validation and decoding into
/// domain events happen in [`crate::decode`], where a shape problem
/// becomes [`SourceError::MalformedLog`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub log_index: Option<String>,
    /// Set by providers when the log was removed in a reorg.
    #[serde(default)]
    pub removed: bool,
}

/// Subset of `eth_getBlockByNumber` needed for timestamps.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBlock {
    #[serde(default)]
    pub timestamp: Option<String>,
}
