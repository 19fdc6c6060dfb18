//! Summary statistics over a ledger snapshot.

use crate::entities::BetState;
use crate::entities::snapshots::{LedgerSnapshot, StatsSnapshot};
use alloy_primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};

/// Derive summary counters from a snapshot.
///
/// Pure function; payouts are summed with full-width integer arithmetic
/// so large wei values never lose precision.
pub fn aggregate(snapshot: &LedgerSnapshot) -> StatsSnapshot {
    let mut wins = 0u64;
    let mut losses = 0u64;
    let mut total_payout_wei = U256::ZERO;

    for record in snapshot.records() {
        match record.state {
            BetState::Won => {
                wins += 1;
                total_payout_wei = total_payout_wei.saturating_add(record.payout_wei);
            }
            BetState::Lost => losses += 1,
            BetState::Pending => {}
        }
    }

    let total_bets = snapshot.len() as u64;
    StatsSnapshot {
        total_bets,
        wins,
        losses,
        total_payout_wei,
        win_rate_percent: win_rate_percent(wins, total_bets),
    }
}

/// `100 * wins / total`, rounded half-up to one decimal place.
fn win_rate_percent(wins: u64, total: u64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(wins) * Decimal::ONE_HUNDRED / Decimal::from(total))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::BetChoice;
    use crate::entities::chain_log::{BetPlacedLog, BetResolvedLog, LogPosition};
    use crate::processors::reconciler::reconcile;
    use alloy_primitives::Address;

    fn player() -> Address {
        Address::repeat_byte(0xAA)
    }

    fn placed(id: u64, block: u64) -> BetPlacedLog {
        BetPlacedLog {
            request_id: U256::from(id),
            player: player(),
            amount_wei: U256::from(10u64).pow(U256::from(17)),
            choice: BetChoice::Odd,
            position: LogPosition::new(block, 0),
            block_timestamp: 1_700_000_000,
        }
    }

    fn resolved(id: u64, win: bool, payout_wei: U256, block: u64) -> BetResolvedLog {
        BetResolvedLog {
            request_id: U256::from(id),
            player: player(),
            win,
            payout_wei,
            position: LogPosition::new(block, 1),
        }
    }

    fn snapshot(placed: &[BetPlacedLog], resolved: &[BetResolvedLog]) -> LedgerSnapshot {
        reconcile(player(), 1, placed, resolved).snapshot
    }

    #[test]
    fn test_empty_ledger() {
        let stats = aggregate(&snapshot(&[], &[]));
        assert_eq!(stats.total_bets, 0);
        assert_eq!(stats.win_rate_percent, Decimal::ZERO);
        assert_eq!(stats.total_payout_wei, U256::ZERO);
    }

    #[test]
    fn test_counters_partition_the_ledger() {
        let stats = aggregate(&snapshot(
            &[placed(1, 10), placed(2, 11), placed(3, 12)],
            &[
                resolved(1, true, U256::from(5u64), 20),
                resolved(2, false, U256::ZERO, 21),
            ],
        ));
        assert_eq!(stats.total_bets, 3);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.losses, 1);
        // wins + losses + pending = total
        assert_eq!(stats.wins + stats.losses + 1, stats.total_bets);
    }

    #[test]
    fn test_payout_sum_is_exact_integer_arithmetic() {
        let one_eth = U256::from(10u64).pow(U256::from(18));
        let stats = aggregate(&snapshot(
            &[placed(1, 10), placed(2, 11)],
            &[
                resolved(1, true, one_eth, 20),
                resolved(2, true, U256::from(3u64), 21),
            ],
        ));
        assert_eq!(stats.total_payout_wei, one_eth + U256::from(3u64));
        assert_eq!(
            stats.total_payout_wei.to_string(),
            "1000000000000000003"
        );
    }

    #[test]
    fn test_orphans_count_toward_totals() {
        let stats = aggregate(&snapshot(&[], &[resolved(9, true, U256::from(7u64), 30)]));
        assert_eq!(stats.total_bets, 1);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.win_rate_percent, Decimal::from(100));
    }

    #[test]
    fn test_win_rate_rounding() {
        // 1/3 -> 33.3
        assert_eq!(win_rate_percent(1, 3), Decimal::new(333, 1));
        // 1/16 = 6.25 -> half-up -> 6.3
        assert_eq!(win_rate_percent(1, 16), Decimal::new(63, 1));
        // 1/1 -> 100
        assert_eq!(win_rate_percent(1, 1), Decimal::from(100));
        // 0 bets -> 0, not a division error
        assert_eq!(win_rate_percent(0, 0), Decimal::ZERO);
    }
}
