//! Wallet session lifecycle.
//!
//! The SessionManager is responsible for:
//! - Driving the `Disconnected -> Connecting -> Connected` state machine
//! - Stamping every connected session with a fresh, monotonic generation
//! - Re-stamping on account or chain change notifications
//! - Publishing state transitions over a watch channel so the refresh
//!   coordinator (and any other subscriber) can react without polling
//!
//! Generations are never reused, even across disconnect/reconnect cycles,
//! so any in-flight fetch can detect that its session is no longer the
//! current one.

use alloy_primitives::Address;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

/// Errors from a wallet connection attempt.
///
/// All of these are terminal for the attempted connect and leave the
/// previously published session, if any, intact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No wallet with signing capability is present.
    #[error("no wallet with signing capability is available")]
    NoWalletAvailable,

    /// The user declined the connection request.
    #[error("wallet connection request was rejected by the user")]
    UserRejected,

    /// The provider failed for another reason.
    #[error("wallet provider error: {0}")]
    Provider(String),
}

/// A successful wallet connection as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConnection {
    pub account: Address,
    pub chain_id: u64,
    pub can_sign: bool,
}

/// Boundary to the wallet provider (browser extension, keystore, ...).
///
/// The provider also delivers account/chain change notifications; the host
/// forwards those to [`SessionManager::account_changed`] and
/// [`SessionManager::chain_changed`].
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Request a connection, prompting the user if necessary.
    async fn request_connection(&self) -> Result<WalletConnection, WalletError>;
}

/// An established wallet session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub account: Address,
    pub chain_id: u64,
    pub can_sign: bool,
    /// Monotonic counter identifying this session instance. Incremented on
    /// every account or chain change; used to discard stale async results.
    pub generation: u64,
}

/// Lifecycle state of the wallet session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Connected(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Connected(session) => Some(session),
            _ => None,
        }
    }

    /// Generation of the connected session, if any.
    pub fn generation(&self) -> Option<u64> {
        self.session().map(|s| s.generation)
    }
}

/// Owns the wallet session and its transitions.
pub struct SessionManager {
    state_tx: watch::Sender<SessionState>,
    next_generation: u64,
}

impl SessionManager {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(SessionState::Disconnected);
        Self {
            state_tx,
            next_generation: 0,
        }
    }

    /// Subscribe to session state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// The currently published session state.
    pub fn current_session(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    /// Attempt to connect through the given provider.
    ///
    /// Publishes `Connecting` for the duration of the attempt. On failure
    /// the previous state is restored, so a rejected reconnect does not
    /// tear down a working session.
    pub async fn connect(&mut self, provider: &dyn WalletProvider) -> Result<Session, WalletError> {
        let previous = self.state_tx.borrow().clone();
        self.state_tx.send_replace(SessionState::Connecting);

        let connection = match provider.request_connection().await {
            Ok(connection) => connection,
            Err(error) => {
                warn!(error = %error, "wallet connection failed");
                self.state_tx.send_replace(previous);
                return Err(error);
            }
        };

        if !connection.can_sign {
            warn!(account = %connection.account, "wallet cannot sign, refusing connection");
            self.state_tx.send_replace(previous);
            return Err(WalletError::NoWalletAvailable);
        }

        let session = Session {
            account: connection.account,
            chain_id: connection.chain_id,
            can_sign: connection.can_sign,
            generation: self.bump_generation(),
        };
        info!(
            account = %session.account,
            chain_id = session.chain_id,
            generation = session.generation,
            "wallet connected"
        );
        self.state_tx
            .send_replace(SessionState::Connected(session.clone()));
        Ok(session)
    }

    /// Handle the provider's account-change notification.
    ///
    /// Ignored unless connected; the new session keeps the chain but gets
    /// a fresh generation.
    pub fn account_changed(&mut self, account: Address) {
        let Some(current) = self.state_tx.borrow().session().cloned() else {
            warn!(account = %account, "account change while not connected, ignoring");
            return;
        };
        let session = Session {
            account,
            generation: self.bump_generation(),
            ..current
        };
        info!(
            account = %session.account,
            generation = session.generation,
            "account changed"
        );
        self.state_tx.send_replace(SessionState::Connected(session));
    }

    /// Handle the provider's chain-change notification.
    pub fn chain_changed(&mut self, chain_id: u64) {
        let Some(current) = self.state_tx.borrow().session().cloned() else {
            warn!(chain_id = chain_id, "chain change while not connected, ignoring");
            return;
        };
        let session = Session {
            chain_id,
            generation: self.bump_generation(),
            ..current
        };
        info!(
            chain_id = session.chain_id,
            generation = session.generation,
            "chain changed"
        );
        self.state_tx.send_replace(SessionState::Connected(session));
    }

    /// Explicit disconnect, or teardown after an unrecoverable provider
    /// error. Resets to `Disconnected`; the generation counter keeps its
    /// value so later sessions still get fresh generations.
    pub fn disconnect(&mut self) {
        info!("wallet disconnected");
        self.state_tx.send_replace(SessionState::Disconnected);
    }

    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
