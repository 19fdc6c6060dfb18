//! Decoded log events from the casino contract.
//!
//! These are the raw, immutable inputs to reconciliation. The two event
//! streams share the contract's `requestId` as correlation key and may
//! arrive out of order or incompletely; nothing here assumes otherwise.

use crate::entities::BetChoice;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Position of a log within the chain.
///
/// The derived `Ord` is lexicographic over `(block_number, log_index)`,
/// which is the ordering used for placement dedup, resolution precedence
/// and the latest-result selection. Never order by arrival time.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LogPosition {
    pub block_number: u64,
    pub log_index: u64,
}

impl LogPosition {
    pub fn new(block_number: u64, log_index: u64) -> Self {
        Self {
            block_number,
            log_index,
        }
    }
}

/// A decoded `BetPlaced` log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetPlacedLog {
    /// Correlation id shared with the eventual `BetResolved` event.
    pub request_id: U256,
    pub player: Address,
    pub amount_wei: U256,
    pub choice: BetChoice,
    pub position: LogPosition,
    /// Unix timestamp of the containing block.
    pub block_timestamp: i64,
}

/// A decoded `BetResolved` log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetResolvedLog {
    /// Correlation id shared with the originating `BetPlaced` event.
    pub request_id: U256,
    pub player: Address,
    pub win: bool,
    pub payout_wei: U256,
    pub position: LogPosition,
}
