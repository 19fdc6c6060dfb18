pub mod bet_record;
pub mod chain_log;
pub mod snapshots;

use serde::{Deserialize, Serialize};

/// Parity side of a wager.
///
/// The casino contract encodes the choice as a `uint8`: `0` for even,
/// `1` for odd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BetChoice {
    Even,
    Odd,
}

impl BetChoice {
    /// Decode the on-chain `uint8` representation.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(BetChoice::Even),
            1 => Some(BetChoice::Odd),
            _ => None,
        }
    }
}

impl std::fmt::Display for BetChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BetChoice::Even => write!(f, "Even"),
            BetChoice::Odd => write!(f, "Odd"),
        }
    }
}

/// Lifecycle state of a bet record.
///
/// Transitions are `Pending -> Won` or `Pending -> Lost`, exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BetState {
    Pending,
    Won,
    Lost,
}

impl BetState {
    /// Whether the bet has reached a terminal state.
    pub fn is_resolved(&self) -> bool {
        matches!(self, BetState::Won | BetState::Lost)
    }
}

impl std::fmt::Display for BetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BetState::Pending => write!(f, "Pending"),
            BetState::Won => write!(f, "Won"),
            BetState::Lost => write!(f, "Lost"),
        }
    }
}
