//! Bet ledger reconciliation.
//!
//! The reconciler is responsible for:
//! - Deduplicating the `BetPlaced` stream by `request_id`
//! - Building one `Pending` record per distinct placement
//! - Applying `BetResolved` events with first-resolution-wins semantics
//! - Materializing orphan records for resolutions without a placement
//!
//! `reconcile` is a total, deterministic, pure function over the fetched
//! event sets. It is re-run from raw events on every refresh, with no
//! incremental merge across calls, so the output depends only on the
//! inputs and cannot drift.

use crate::entities::bet_record::BetRecord;
use crate::entities::chain_log::{BetPlacedLog, BetResolvedLog};
use crate::entities::snapshots::LedgerSnapshot;
use alloy_primitives::{Address, U256};
use itertools::Itertools;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub snapshot: LedgerSnapshot,
    /// Correlation ids of resolutions observed without a matching
    /// placement. Non-empty output suggests the placement-side fetch
    /// window was narrower than the resolution-side one.
    pub orphaned_resolutions: Vec<U256>,
}

/// Merge the two event streams into a deduplicated ledger snapshot.
///
/// Events for a different player than `player` are skipped; the filter
/// upstream should already have excluded them.
pub fn reconcile(
    player: Address,
    generation: u64,
    placed: &[BetPlacedLog],
    resolved: &[BetResolvedLog],
) -> Reconciled {
    let mut records: BTreeMap<U256, BetRecord> = BTreeMap::new();

    // Placements in chain order; the entry API keeps the earliest
    // observed event for a duplicated id and drops the rest.
    for event in placed.iter().sorted_by_key(|e| e.position) {
        if event.player != player {
            warn!(
                expected = %player,
                received = %event.player,
                request_id = %event.request_id,
                "skipping placement for a different player"
            );
            continue;
        }
        records
            .entry(event.request_id)
            .and_modify(|_| {
                debug!(request_id = %event.request_id, "duplicate placement ignored");
            })
            .or_insert_with(|| BetRecord::from_placed(event));
    }

    // Resolutions in chain order, so "first resolution wins" means first
    // on chain, not first to arrive.
    let mut orphaned_resolutions = Vec::new();
    for event in resolved.iter().sorted_by_key(|e| e.position) {
        if event.player != player {
            warn!(
                expected = %player,
                received = %event.player,
                request_id = %event.request_id,
                "skipping resolution for a different player"
            );
            continue;
        }
        match records.get_mut(&event.request_id) {
            Some(record) => {
                if !record.resolve(event) {
                    debug!(
                        request_id = %event.request_id,
                        "duplicate resolution ignored, record already resolved"
                    );
                }
            }
            None => {
                warn!(
                    request_id = %event.request_id,
                    win = event.win,
                    "resolution without a matching placement, materializing orphan record"
                );
                records.insert(event.request_id, BetRecord::from_orphan_resolution(event));
                orphaned_resolutions.push(event.request_id);
            }
        }
    }

    Reconciled {
        snapshot: LedgerSnapshot::new(player, generation, records.into_values().collect()),
        orphaned_resolutions,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::chain_log::LogPosition;
    use crate::entities::{BetChoice, BetState};

    fn player() -> Address {
        Address::repeat_byte(0xAA)
    }

    fn placed(id: u64, amount_eth_milli: u64, block: u64, log_index: u64) -> BetPlacedLog {
        BetPlacedLog {
            request_id: U256::from(id),
            player: player(),
            amount_wei: U256::from(amount_eth_milli) * U256::from(10u64).pow(U256::from(15)),
            choice: BetChoice::Even,
            position: LogPosition::new(block, log_index),
            block_timestamp: 1_700_000_000 + block as i64 * 12,
        }
    }

    fn resolved(id: u64, win: bool, payout_wei: u64, block: u64, log_index: u64) -> BetResolvedLog {
        BetResolvedLog {
            request_id: U256::from(id),
            player: player(),
            win,
            payout_wei: U256::from(payout_wei),
            position: LogPosition::new(block, log_index),
        }
    }

    #[test]
    fn test_duplicate_placement_is_idempotent() {
        let without = reconcile(player(), 1, &[placed(7, 500, 10, 0)], &[]);
        let with = reconcile(
            player(),
            1,
            &[placed(7, 500, 10, 0), placed(7, 500, 11, 3)],
            &[],
        );
        assert_eq!(without.snapshot.len(), with.snapshot.len());
        assert_eq!(with.snapshot.len(), 1);
    }

    #[test]
    fn test_duplicate_placement_keeps_earliest() {
        // Same id placed "twice"; the later event carries a different
        // amount and must lose.
        let out = reconcile(
            player(),
            1,
            &[placed(7, 900, 12, 0), placed(7, 500, 10, 2)],
            &[],
        );
        let record = out.snapshot.get(U256::from(7)).unwrap();
        assert_eq!(record.placed_at.unwrap().position, LogPosition::new(10, 2));
        assert_eq!(
            record.amount_wei,
            U256::from(500u64) * U256::from(10u64).pow(U256::from(15))
        );
    }

    #[test]
    fn test_resolution_transitions_pending_record() {
        let out = reconcile(
            player(),
            1,
            &[placed(7, 500, 10, 0)],
            &[resolved(7, true, 1_000, 12, 1)],
        );
        let record = out.snapshot.get(U256::from(7)).unwrap();
        assert_eq!(record.state, BetState::Won);
        assert_eq!(record.payout_wei, U256::from(1_000u64));
        assert_eq!(record.resolved_at, Some(LogPosition::new(12, 1)));
        assert!(out.orphaned_resolutions.is_empty());
    }

    #[test]
    fn test_resolution_is_irreversible() {
        // A later contradicting resolution must not change state or payout.
        let out = reconcile(
            player(),
            1,
            &[placed(7, 500, 10, 0)],
            &[resolved(7, true, 1_000, 12, 1), resolved(7, false, 0, 13, 0)],
        );
        let record = out.snapshot.get(U256::from(7)).unwrap();
        assert_eq!(record.state, BetState::Won);
        assert_eq!(record.payout_wei, U256::from(1_000u64));
        assert_eq!(record.resolved_at, Some(LogPosition::new(12, 1)));
    }

    #[test]
    fn test_first_resolution_wins_by_chain_order() {
        // Resolutions arrive out of order; the one earlier on chain wins.
        let out = reconcile(
            player(),
            1,
            &[placed(7, 500, 10, 0)],
            &[resolved(7, false, 0, 13, 0), resolved(7, true, 1_000, 12, 1)],
        );
        let record = out.snapshot.get(U256::from(7)).unwrap();
        assert_eq!(record.state, BetState::Won);
    }

    #[test]
    fn test_orphan_resolution_is_materialized() {
        let out = reconcile(player(), 1, &[], &[resolved(42, true, 2_000, 20, 0)]);
        assert_eq!(out.snapshot.len(), 1);
        assert_eq!(out.orphaned_resolutions, vec![U256::from(42)]);
        let record = out.snapshot.get(U256::from(42)).unwrap();
        assert!(record.orphan);
        assert_eq!(record.state, BetState::Won);
        assert_eq!(record.amount_wei, U256::ZERO);
        assert_eq!(record.payout_wei, U256::from(2_000u64));
        assert!(record.placed_at.is_none());
        assert!(record.choice.is_none());
    }

    #[test]
    fn test_lost_record_has_zero_payout() {
        // Some contracts emit the wager amount in the payout field on a
        // loss; the record must still show zero.
        let out = reconcile(
            player(),
            1,
            &[placed(7, 500, 10, 0)],
            &[resolved(7, false, 999, 12, 1)],
        );
        let record = out.snapshot.get(U256::from(7)).unwrap();
        assert_eq!(record.state, BetState::Lost);
        assert_eq!(record.payout_wei, U256::ZERO);
    }

    #[test]
    fn test_output_is_independent_of_input_order() {
        let placed_events = [placed(1, 100, 10, 0), placed(2, 200, 11, 0)];
        let resolved_events = [resolved(1, true, 300, 12, 0), resolved(2, false, 0, 13, 0)];

        let forward = reconcile(player(), 1, &placed_events, &resolved_events);

        let placed_rev: Vec<_> = placed_events.iter().rev().cloned().collect();
        let resolved_rev: Vec<_> = resolved_events.iter().rev().cloned().collect();
        let backward = reconcile(player(), 1, &placed_rev, &resolved_rev);

        assert_eq!(forward.snapshot, backward.snapshot);
        assert_eq!(forward.orphaned_resolutions, backward.orphaned_resolutions);
    }

    #[test]
    fn test_foreign_player_events_are_skipped() {
        let mut foreign = placed(9, 100, 10, 0);
        foreign.player = Address::repeat_byte(0xBB);
        let out = reconcile(player(), 1, &[foreign], &[]);
        assert!(out.snapshot.is_empty());
    }

    #[test]
    fn test_records_ordered_by_chain_position() {
        let out = reconcile(
            player(),
            1,
            &[placed(2, 100, 20, 0), placed(1, 100, 10, 0)],
            &[],
        );
        let ids: Vec<U256> = out.snapshot.records().iter().map(|r| r.request_id).collect();
        assert_eq!(ids, vec![U256::from(1), U256::from(2)]);
    }
}
