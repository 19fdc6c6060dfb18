//! Refresh signaling between the host application and the coordinator.
//!
//! The coordinator re-fetches on two kinds of trigger: session generation
//! changes (observed through the session watch channel) and explicit
//! [`RefreshSignal`]s sent over the channel created here, most importantly
//! after a wager placement transaction confirms on chain.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, RefreshHandle, RefreshSignalReceiver, RefreshSignalSender,
    refresh_signal_channel,
};
pub use types::{RefreshReason, RefreshSignal};
