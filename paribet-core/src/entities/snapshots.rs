//! Immutable views produced by one reconciliation pass.
//!
//! A snapshot is never mutated after publication; every refresh rebuilds
//! a new one from raw events (copy-on-reconcile).

use crate::entities::bet_record::BetRecord;
use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::Serialize;

/// The full set of reconciled bet records for one account at one session
/// generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
    player: Address,
    generation: u64,
    records: Vec<BetRecord>,
}

impl LedgerSnapshot {
    /// Build a snapshot, ordering records by chain position.
    pub fn new(player: Address, generation: u64, mut records: Vec<BetRecord>) -> Self {
        records.sort_by_key(BetRecord::chain_position);
        Self {
            player,
            generation,
            records,
        }
    }

    pub fn player(&self) -> Address {
        self.player
    }

    /// The session generation whose fetch produced this snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Records in chain-position order.
    pub fn records(&self) -> &[BetRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by its correlation id.
    pub fn get(&self, request_id: U256) -> Option<&BetRecord> {
        self.records.iter().find(|r| r.request_id == request_id)
    }
}

/// Summary counters derived from a [`LedgerSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Record count, orphans included.
    pub total_bets: u64,
    pub wins: u64,
    pub losses: u64,
    /// Exact integer sum of payouts over won records.
    pub total_payout_wei: U256,
    /// `100 * wins / total_bets`, rounded half-up to one decimal place;
    /// zero when no bets exist.
    pub win_rate_percent: Decimal,
}

/// The most recently resolved wager, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GainSnapshot {
    /// Resolved record with the greatest `(block_number, log_index)`.
    pub latest_resolved: Option<BetRecord>,
}
