//! Error types for the relay.

use splash_protocol::ProtocolError;

/// Errors from running the relay server or talking to a room actor.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The listener could not be bound.
    #[error("failed to bind listener: {0}")]
    Bind(#[source] std::io::Error),

    /// The websocket upgrade failed (including 400-rejected requests
    /// with no usable room code).
    #[error("websocket handshake failed: {0}")]
    Handshake(#[from] tokio_tungstenite::tungstenite::Error),

    /// The upgrade succeeded but no room code was captured.
    #[error("connection carried no room code")]
    MissingRoomCode,

    /// The room's command channel is closed.
    #[error("room {0} is unavailable")]
    RoomUnavailable(String),

    /// An outbound message could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
