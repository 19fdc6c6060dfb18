//! Processors for the client-side data flow.
//!
//! Data flows session-first:
//!
//! - `SessionManager`: owns the wallet session, publishes generation changes
//! - `RefreshCoordinator`: reacts to session changes and `RefreshSignal`s,
//!   fetches the event streams, guards against stale results
//! - `reconcile`: merges the two streams into a `LedgerSnapshot`
//! - `aggregate` / `extract_latest`: derive stats and the latest result
//!
//! The reconciler, aggregator and extractor are pure functions; all I/O and
//! all fallibility live in the coordinator and the event source behind it.

pub mod gain_extractor;
pub mod reconciler;
pub mod refresh_coordinator;
pub mod session_manager;
pub mod stats_aggregator;

pub use gain_extractor::extract_latest;
pub use reconciler::{Reconciled, reconcile};
pub use refresh_coordinator::{LedgerView, RefreshCoordinator, RefreshError};
pub use session_manager::{
    Session, SessionManager, SessionState, WalletConnection, WalletError, WalletProvider,
};
pub use stats_aggregator::aggregate;
