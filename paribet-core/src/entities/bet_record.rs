//! Reconciled bet records.

use crate::entities::chain_log::{BetPlacedLog, BetResolvedLog, LogPosition};
use crate::entities::{BetChoice, BetState};
use alloy_primitives::{Address, U256};
use serde::Serialize;

/// Where and when a bet placement was observed on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlacedAt {
    pub position: LogPosition,
    /// Unix timestamp of the placement block.
    pub timestamp: i64,
}

/// One reconciled wager, keyed by `request_id` within a single account.
///
/// Invariants maintained by the reconciler:
/// - `payout_wei` is zero unless `state` is `Won`;
/// - `placed_at` and `choice` are `None` exactly when `orphan` is set
///   (a resolution observed without its placement carries no amount,
///   choice or placement coordinates);
/// - once resolved, `state`, `payout_wei` and `resolved_at` never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BetRecord {
    pub request_id: U256,
    pub player: Address,
    /// Wager amount; zero for orphan records.
    pub amount_wei: U256,
    pub choice: Option<BetChoice>,
    pub state: BetState,
    pub payout_wei: U256,
    pub placed_at: Option<PlacedAt>,
    pub resolved_at: Option<LogPosition>,
    /// Set when the resolution was observed without a matching placement.
    pub orphan: bool,
}

impl BetRecord {
    /// Build a `Pending` record from a placement event.
    pub fn from_placed(log: &BetPlacedLog) -> Self {
        Self {
            request_id: log.request_id,
            player: log.player,
            amount_wei: log.amount_wei,
            choice: Some(log.choice),
            state: BetState::Pending,
            payout_wei: U256::ZERO,
            placed_at: Some(PlacedAt {
                position: log.position,
                timestamp: log.block_timestamp,
            }),
            resolved_at: None,
            orphan: false,
        }
    }

    /// Build an orphan record directly from a resolution event.
    pub fn from_orphan_resolution(log: &BetResolvedLog) -> Self {
        Self {
            request_id: log.request_id,
            player: log.player,
            amount_wei: U256::ZERO,
            choice: None,
            state: if log.win { BetState::Won } else { BetState::Lost },
            payout_wei: if log.win { log.payout_wei } else { U256::ZERO },
            placed_at: None,
            resolved_at: Some(log.position),
            orphan: true,
        }
    }

    /// Apply a resolution event.
    ///
    /// Returns `false` without touching the record if it is already
    /// resolved (first resolution wins; transitions are irreversible).
    pub fn resolve(&mut self, log: &BetResolvedLog) -> bool {
        if self.state.is_resolved() {
            return false;
        }
        self.state = if log.win { BetState::Won } else { BetState::Lost };
        self.payout_wei = if log.win { log.payout_wei } else { U256::ZERO };
        self.resolved_at = Some(log.position);
        true
    }

    pub fn is_resolved(&self) -> bool {
        self.state.is_resolved()
    }

    /// Chain position used to order records within a snapshot.
    ///
    /// Non-orphan records order by their placement; orphans only have a
    /// resolution to order by.
    pub fn chain_position(&self) -> LogPosition {
        match self.placed_at {
            Some(placed) => placed.position,
            None => self.resolved_at.unwrap_or_default(),
        }
    }

    /// Placement time as an [`time::OffsetDateTime`], if the timestamp is
    /// representable. `None` for orphan records.
    pub fn placed_time(&self) -> Option<time::OffsetDateTime> {
        self.placed_at
            .and_then(|p| time::OffsetDateTime::from_unix_timestamp(p.timestamp).ok())
    }
}
