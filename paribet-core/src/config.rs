//! Client configuration.
//!
//! The host application supplies one [`LedgerConfig`] per deployment; the
//! structs deserialize directly from a TOML section so hosts can keep them
//! in a config file.

use crate::source::BlockRange;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Configuration for the bet ledger client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Address of the casino contract emitting `BetPlaced`/`BetResolved`.
    pub contract: Address,

    /// Trailing block window for event fetches. `None` fetches from
    /// genesis. A narrow window is cheaper on public RPC endpoints but can
    /// miss placements whose resolutions still fall inside the window,
    /// which surfaces as orphan resolutions.
    #[serde(default)]
    pub lookback_blocks: Option<u64>,

    #[serde(default)]
    pub retry: RetryConfig,
}

impl LedgerConfig {
    pub fn new(contract: Address) -> Self {
        Self {
            contract,
            lookback_blocks: None,
            retry: RetryConfig::default(),
        }
    }

    /// The block range to fetch on each refresh.
    pub fn block_range(&self) -> BlockRange {
        match self.lookback_blocks {
            Some(blocks) => BlockRange::Lookback { blocks },
            None => BlockRange::FromGenesis,
        }
    }
}

/// Retry policy for transient event-source failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total fetch attempts before the failure is surfaced. Malformed
    /// responses are never retried regardless of this setting.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
