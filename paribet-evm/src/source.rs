//! EVM-backed event source.
//!
//! Implements the core [`EventSource`] port over plain JSON-RPC:
//! `eth_getLogs` per stream, `eth_blockNumber` to resolve trailing
//! windows, and `eth_getBlockByNumber` for placement timestamps with a
//! per-instance cache (one lookup per distinct block, instead of one per
//! event).

use crate::decode::{self, BET_PLACED_TOPIC, BET_RESOLVED_TOPIC};
use crate::rpc::{LogFilterParams, RawBlock, RawLog, RpcClient};
use alloy_primitives::B256;
use async_trait::async_trait;
use paribet_core::entities::chain_log::{BetPlacedLog, BetResolvedLog};
use paribet_core::source::{BlockRange, EventFilter, EventSource, SourceError};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

/// Event source backed by an Ethereum JSON-RPC endpoint.
pub struct EvmEventSource {
    rpc: RpcClient,
    timestamps: Mutex<HashMap<u64, i64>>,
}

impl EvmEventSource {
    pub fn new(endpoint: Url) -> Self {
        Self {
            rpc: RpcClient::new(endpoint),
            timestamps: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a [`BlockRange`] into `fromBlock`/`toBlock` parameters.
    ///
    /// Only `Lookback` needs the chain head and therefore an extra RPC
    /// round trip.
    async fn resolve_range(&self, range: BlockRange) -> Result<(String, String), SourceError> {
        match range {
            BlockRange::FromGenesis => Ok(("0x0".to_string(), "latest".to_string())),
            BlockRange::Span { from, to } => Ok((format!("{from:#x}"), format!("{to:#x}"))),
            BlockRange::Lookback { blocks } => {
                let head: String = self.rpc.call("eth_blockNumber", [(); 0]).await?;
                let head = decode::parse_quantity(Some(head.as_str()), "blockNumber")?;
                let from = head.saturating_sub(blocks);
                Ok((format!("{from:#x}"), "latest".to_string()))
            }
        }
    }

    async fn fetch_logs(
        &self,
        filter: &EventFilter,
        topic0: B256,
    ) -> Result<Vec<RawLog>, SourceError> {
        let (from_block, to_block) = self.resolve_range(filter.range).await?;
        let params = LogFilterParams {
            from_block,
            to_block,
            address: filter.contract.to_string(),
            topics: vec![
                Some(topic0.to_string()),
                Some(filter.player.into_word().to_string()),
            ],
        };
        self.rpc.call("eth_getLogs", (params,)).await
    }

    async fn timestamp_for(&self, block_number: u64) -> Result<i64, SourceError> {
        {
            let cache = self.timestamps.lock().await;
            if let Some(timestamp) = cache.get(&block_number) {
                return Ok(*timestamp);
            }
        }

        let block: RawBlock = self
            .rpc
            .call("eth_getBlockByNumber", (format!("{block_number:#x}"), false))
            .await?;
        let raw = decode::parse_quantity(block.timestamp.as_deref(), "timestamp")?;
        let timestamp = i64::try_from(raw).map_err(|_| {
            SourceError::MalformedLog(format!("block timestamp out of range: {raw}"))
        })?;

        self.timestamps.lock().await.insert(block_number, timestamp);
        Ok(timestamp)
    }
}

#[async_trait]
impl EventSource for EvmEventSource {
    async fn fetch_placed(&self, filter: &EventFilter) -> Result<Vec<BetPlacedLog>, SourceError> {
        let raw = live_logs(self.fetch_logs(filter, *BET_PLACED_TOPIC).await?);
        let mut out = Vec::with_capacity(raw.len());
        for log in &raw {
            let data = decode::decode_placed(log)?;
            let timestamp = self.timestamp_for(data.position.block_number).await?;
            out.push(data.into_log(timestamp));
        }
        debug!(player = %filter.player, count = out.len(), "fetched BetPlaced logs");
        Ok(out)
    }

    async fn fetch_resolved(
        &self,
        filter: &EventFilter,
    ) -> Result<Vec<BetResolvedLog>, SourceError> {
        let raw = live_logs(self.fetch_logs(filter, *BET_RESOLVED_TOPIC).await?);
        let mut out = Vec::with_capacity(raw.len());
        for log in &raw {
            out.push(decode::decode_resolved(log)?);
        }
        debug!(player = %filter.player, count = out.len(), "fetched BetResolved logs");
        Ok(out)
    }

    async fn block_timestamp(&self, block_number: u64) -> Result<i64, SourceError> {
        self.timestamp_for(block_number).await
    }
}

/// Drop logs the provider flagged as removed in a chain reorg.
fn live_logs(raw: Vec<RawLog>) -> Vec<RawLog> {
    raw.into_iter()
        .filter(|log| {
            if log.removed {
                debug!("skipping reorged log");
            }
            !log.removed
        })
        .collect()
}
