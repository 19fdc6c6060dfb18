//! Event type definitions.

/// Why a refresh was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    /// A wager placement transaction was confirmed on chain.
    BetConfirmed,
    /// Caller-initiated refresh with no specific cause.
    Manual,
}

impl std::fmt::Display for RefreshReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshReason::BetConfirmed => write!(f, "bet_confirmed"),
            RefreshReason::Manual => write!(f, "manual"),
        }
    }
}

/// External signal asking the coordinator to re-fetch the ledger.
///
/// Signals are ephemeral and idempotent: they carry no data, and the
/// coordinator re-fetches the full event streams on every trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSignal {
    pub reason: RefreshReason,
}
