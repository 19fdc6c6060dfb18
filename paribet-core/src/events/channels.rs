//! Refresh signal channel and its sender-side handle.

use super::types::{RefreshReason, RefreshSignal};
use tokio::sync::mpsc;
use tracing::warn;

/// Buffer size for the refresh signal channel.
///
/// Refresh signals are low-volume (one per confirmed wager or explicit
/// user action); a small buffer keeps memory bounded while absorbing
/// bursts.
pub const DEFAULT_CHANNEL_BUFFER: usize = 32;

/// Sender handle for refresh signals.
pub type RefreshSignalSender = mpsc::Sender<RefreshSignal>;
/// Receiver handle for refresh signals.
pub type RefreshSignalReceiver = mpsc::Receiver<RefreshSignal>;

/// Create a new refresh signal channel.
///
/// Multiple senders can be cloned from the returned sender.
pub fn refresh_signal_channel() -> (RefreshSignalSender, RefreshSignalReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Handle given to the submission flow and the presentation layer to
/// trigger a ledger refresh.
#[derive(Clone)]
pub struct RefreshHandle {
    tx: RefreshSignalSender,
}

impl RefreshHandle {
    pub fn new(tx: RefreshSignalSender) -> Self {
        Self { tx }
    }

    /// Signal that a wager placement was confirmed on chain.
    ///
    /// Must be invoked by the submission boundary after the placement
    /// transaction's confirmation so the ledger picks up the new bet.
    pub async fn bet_confirmed(&self) {
        self.send(RefreshReason::BetConfirmed).await;
    }

    /// Ask for a refresh without a specific cause.
    pub async fn refresh(&self) {
        self.send(RefreshReason::Manual).await;
    }

    async fn send(&self, reason: RefreshReason) {
        if self.tx.send(RefreshSignal { reason }).await.is_err() {
            warn!(reason = %reason, "refresh signal dropped, coordinator is no longer running");
        }
    }
}
