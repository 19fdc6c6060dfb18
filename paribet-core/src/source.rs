//! The event-source boundary.
//!
//! The ledger is rebuilt from two append-only log streams fetched through
//! this port. Implementations are pure reads with no side effects and no retry;
//! retry policy lives in the refresh coordinator.

use crate::entities::chain_log::{BetPlacedLog, BetResolvedLog};
use alloy_primitives::Address;
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by an [`EventSource`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Transport or provider failure. The same fetch may be retried.
    #[error("event source unavailable: {0}")]
    Unavailable(String),

    /// A returned log entry could not be decoded into the expected shape.
    /// Retrying would return the same data; surfaced immediately.
    #[error("malformed log entry: {0}")]
    MalformedLog(String),
}

impl SourceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Unavailable(_))
    }
}

/// Block range of a historical log query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRange {
    /// Everything from genesis to the chain head.
    FromGenesis,
    /// The trailing `blocks` blocks before the current head, resolved by
    /// the source at query time.
    Lookback { blocks: u64 },
    /// An explicit inclusive span.
    Span { from: u64, to: u64 },
}

/// Filter for one account's bet events on one contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFilter {
    pub contract: Address,
    pub player: Address,
    pub range: BlockRange,
}

/// Read-only access to the contract's bet event streams.
///
/// Both fetches return events in whatever order the provider yields them;
/// consumers must not assume ordering or completeness across the two
/// streams.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch the `BetPlaced` stream for the filtered account.
    async fn fetch_placed(&self, filter: &EventFilter) -> Result<Vec<BetPlacedLog>, SourceError>;

    /// Fetch the `BetResolved` stream for the filtered account.
    async fn fetch_resolved(&self, filter: &EventFilter)
    -> Result<Vec<BetResolvedLog>, SourceError>;

    /// Unix timestamp of the given block.
    async fn block_timestamp(&self, block_number: u64) -> Result<i64, SourceError>;
}
