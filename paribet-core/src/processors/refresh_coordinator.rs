//! Refresh coordination.
//!
//! The RefreshCoordinator is responsible for:
//! - Watching the wallet session for generation changes
//! - Receiving external `RefreshSignal` events (after a confirmed wager,
//!   or on explicit request)
//! - Fetching the placed and resolved log streams concurrently, retrying
//!   transient source failures with exponential backoff
//! - Discarding any fetch result whose session generation is no longer
//!   current (the stale-result guard)
//! - Publishing ledger, stats and gain snapshots atomically as one view
//!
//! Multiple fetches may be in flight at once (rapid account switching);
//! triggers are never serialized. Correctness rests entirely on comparing
//! each outcome's captured generation against the current session at apply
//! time, not on cancelling superseded fetches.

use crate::config::LedgerConfig;
use crate::entities::chain_log::{BetPlacedLog, BetResolvedLog};
use crate::entities::snapshots::{GainSnapshot, LedgerSnapshot, StatsSnapshot};
use crate::events::RefreshSignalReceiver;
use crate::processors::gain_extractor::extract_latest;
use crate::processors::reconciler::reconcile;
use crate::processors::session_manager::{Session, SessionState};
use crate::processors::stats_aggregator::aggregate;
use crate::source::{EventFilter, EventSource, SourceError};
use alloy_primitives::U256;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Backoff is capped at 2^5 = 32 seconds.
const MAX_BACKOFF_EXPONENT: u32 = 5;

/// Buffer for fetch outcomes flowing back into the coordinator loop.
const OUTCOME_CHANNEL_BUFFER: usize = 16;

/// Errors surfaced on the published view when a refresh fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// The event source stayed unavailable through every retry attempt.
    #[error("event source unavailable after {attempts} attempts: {last}")]
    SourceUnavailable { attempts: u32, last: String },

    /// A log entry failed to decode. Not retried.
    #[error("malformed log entry: {0}")]
    MalformedLog(String),
}

/// The atomically published client view of one account's ledger.
///
/// A view is replaced as a whole, never as a half-updated mix of old and new
/// snapshots. On a failed refresh the snapshots keep their last successful
/// values and only `error`/`refreshing` change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerView {
    pub ledger: Option<LedgerSnapshot>,
    pub stats: Option<StatsSnapshot>,
    pub gain: Option<GainSnapshot>,
    /// Correlation ids of resolutions with no matching placement in the
    /// last fetch window. A hint to widen `lookback_blocks`.
    pub orphaned_resolutions: Vec<U256>,
    /// Error from the most recent refresh, if it failed.
    pub error: Option<RefreshError>,
    /// Whether a fetch for the current session is in flight.
    pub refreshing: bool,
}

/// Result of one spawned fetch, stamped with the session that issued it.
struct FetchOutcome {
    session: Session,
    result: Result<(Vec<BetPlacedLog>, Vec<BetResolvedLog>), RefreshError>,
}

/// Coordinates ledger refreshes for the current wallet session.
pub struct RefreshCoordinator<S> {
    source: Arc<S>,
    config: LedgerConfig,
    view_tx: watch::Sender<LedgerView>,
}

impl<S: EventSource + 'static> RefreshCoordinator<S> {
    pub fn new(source: Arc<S>, config: LedgerConfig) -> Self {
        let (view_tx, _) = watch::channel(LedgerView::default());
        Self {
            source,
            config,
            view_tx,
        }
    }

    /// Subscribe to published ledger views.
    pub fn subscribe(&self) -> watch::Receiver<LedgerView> {
        self.view_tx.subscribe()
    }

    /// Run the coordinator until shutdown is signaled.
    pub async fn run(
        self,
        mut session_rx: watch::Receiver<SessionState>,
        mut refresh_rx: RefreshSignalReceiver,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let (outcome_tx, mut outcome_rx) = mpsc::channel::<FetchOutcome>(OUTCOME_CHANNEL_BUFFER);

        info!("RefreshCoordinator started");

        // A session may already be connected by the time we start.
        if let SessionState::Connected(session) = session_rx.borrow_and_update().clone() {
            self.spawn_fetch(session, outcome_tx.clone());
        }

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("RefreshCoordinator received shutdown signal");
                        break;
                    }
                }

                changed = session_rx.changed() => {
                    if changed.is_err() {
                        info!("session channel closed");
                        break;
                    }
                    match session_rx.borrow_and_update().clone() {
                        SessionState::Connected(session) => {
                            debug!(
                                player = %session.account,
                                generation = session.generation,
                                "session changed, refreshing ledger"
                            );
                            self.spawn_fetch(session, outcome_tx.clone());
                        }
                        SessionState::Disconnected => {
                            debug!("session disconnected, clearing ledger view");
                            self.view_tx.send_replace(LedgerView::default());
                        }
                        SessionState::Connecting => {}
                    }
                }

                Some(signal) = refresh_rx.recv() => {
                    match session_rx.borrow().clone() {
                        SessionState::Connected(session) => {
                            debug!(
                                reason = %signal.reason,
                                generation = session.generation,
                                "refresh signal received"
                            );
                            self.spawn_fetch(session, outcome_tx.clone());
                        }
                        _ => {
                            debug!(reason = %signal.reason, "refresh signal ignored, no connected session");
                        }
                    }
                }

                Some(outcome) = outcome_rx.recv() => {
                    self.apply_outcome(outcome, &session_rx);
                }
            }
        }

        info!("RefreshCoordinator shutdown complete");
    }

    /// Spawn one fetch for the given session.
    ///
    /// The outcome is generation-checked at apply time, so spawning for a
    /// session that is about to be superseded is harmless.
    fn spawn_fetch(&self, session: Session, outcome_tx: mpsc::Sender<FetchOutcome>) {
        self.view_tx.send_modify(|view| view.refreshing = true);

        let source = Arc::clone(&self.source);
        let filter = EventFilter {
            contract: self.config.contract,
            player: session.account,
            range: self.config.block_range(),
        };
        let max_attempts = self.config.retry.max_attempts;

        tokio::spawn(async move {
            let result = fetch_with_retry(source.as_ref(), &filter, max_attempts).await;
            if outcome_tx.send(FetchOutcome { session, result }).await.is_err() {
                debug!("coordinator stopped before the fetch outcome was delivered");
            }
        });
    }

    /// Apply a completed fetch, or discard it if its generation is stale.
    fn apply_outcome(&self, outcome: FetchOutcome, session_rx: &watch::Receiver<SessionState>) {
        let current_generation = session_rx.borrow().generation();
        if current_generation != Some(outcome.session.generation) {
            debug!(
                fetched_generation = outcome.session.generation,
                current_generation = ?current_generation,
                "discarding stale fetch result"
            );
            return;
        }

        match outcome.result {
            Ok((placed, resolved)) => {
                let reconciled = reconcile(
                    outcome.session.account,
                    outcome.session.generation,
                    &placed,
                    &resolved,
                );
                if !reconciled.orphaned_resolutions.is_empty() {
                    warn!(
                        player = %outcome.session.account,
                        orphans = reconciled.orphaned_resolutions.len(),
                        "resolutions without a matching placement, the fetch window may be too narrow"
                    );
                }
                let stats = aggregate(&reconciled.snapshot);
                let gain = extract_latest(&reconciled.snapshot);
                info!(
                    player = %outcome.session.account,
                    generation = outcome.session.generation,
                    bets = reconciled.snapshot.len(),
                    "published ledger view"
                );
                self.view_tx.send_replace(LedgerView {
                    ledger: Some(reconciled.snapshot),
                    stats: Some(stats),
                    gain: Some(gain),
                    orphaned_resolutions: reconciled.orphaned_resolutions,
                    error: None,
                    refreshing: false,
                });
            }
            Err(refresh_error) => {
                error!(
                    player = %outcome.session.account,
                    error = %refresh_error,
                    "ledger refresh failed, keeping previous snapshots"
                );
                self.view_tx.send_modify(|view| {
                    view.error = Some(refresh_error);
                    view.refreshing = false;
                });
            }
        }
    }
}

/// Fetch both event streams concurrently, retrying transient failures.
async fn fetch_with_retry<S: EventSource + ?Sized>(
    source: &S,
    filter: &EventFilter,
    max_attempts: u32,
) -> Result<(Vec<BetPlacedLog>, Vec<BetResolvedLog>), RefreshError> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match tokio::try_join!(source.fetch_placed(filter), source.fetch_resolved(filter)) {
            Ok(streams) => return Ok(streams),
            Err(SourceError::MalformedLog(message)) => {
                return Err(RefreshError::MalformedLog(message));
            }
            Err(SourceError::Unavailable(message)) => {
                if attempt >= max_attempts {
                    return Err(RefreshError::SourceUnavailable {
                        attempts: attempt,
                        last: message,
                    });
                }
                let delay = retry_delay(attempt - 1);
                warn!(
                    attempt,
                    delay_secs = delay.as_secs(),
                    error = %message,
                    "event source unavailable, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Delay before the next fetch attempt.
///
/// Uses exponential backoff: 2^retry_count seconds, capped.
fn retry_delay(retry_count: u32) -> Duration {
    Duration::from_secs(2u64.pow(retry_count.min(MAX_BACKOFF_EXPONENT)))
}
