//! Client-side error types.
//!
//! Connection problems and rejected actions are separate concerns:
//! [`SessionError`] covers the transport (you can't talk to the relay),
//! [`ActionError`] covers dispatch (you talked, but the action is not
//! yours to take). Neither ever crosses the wire — the relay drops bad
//! traffic silently, so everything here is raised locally, before
//! anything is sent.

use splash_rules::{DealError, PlayError};
use thiserror::Error;

/// Errors establishing or losing the relay connection.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The websocket upgrade failed (relay down, bad address, or the
    /// relay rejected the handshake).
    #[error("failed to connect to relay: {0}")]
    Connect(#[source] tokio_tungstenite::tungstenite::Error),

    /// `connect` was called on a session that is already connected.
    #[error("session is already connected")]
    AlreadyConnected,
}

/// Errors raised when dispatching an action.
///
/// Everything here is decided locally by the session's own rules check;
/// an action that passes is submitted and will be accepted (barring a
/// concurrent authoritative broadcast that changed the turn).
#[derive(Debug, Error)]
pub enum ActionError {
    /// No live connection to submit over.
    #[error("not connected to a room")]
    NotConnected,

    /// `start_game` from a seat other than 0.
    #[error("only the host (seat 0) may start a game")]
    NotHost,

    /// `play`/`pickup` before any game has been started.
    #[error("no game in progress")]
    NoGame,

    /// The rules engine rejected the selection.
    #[error(transparent)]
    Rules(#[from] PlayError),

    /// Dealing a fresh game failed.
    #[error(transparent)]
    Deal(#[from] DealError),
}
