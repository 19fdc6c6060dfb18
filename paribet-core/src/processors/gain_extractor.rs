//! Latest resolved wager extraction.

use crate::entities::snapshots::{GainSnapshot, LedgerSnapshot};

/// Select the resolved record with the greatest `(block_number, log_index)`.
///
/// Ordering is by chain position only, never by arrival order, which is
/// non-deterministic under concurrent fetches. Absent if nothing has
/// resolved yet.
pub fn extract_latest(snapshot: &LedgerSnapshot) -> GainSnapshot {
    let latest_resolved = snapshot
        .records()
        .iter()
        .filter_map(|record| record.resolved_at.map(|position| (position, record)))
        .max_by_key(|(position, _)| *position)
        .map(|(_, record)| record.clone());

    GainSnapshot { latest_resolved }
}
