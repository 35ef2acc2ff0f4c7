//! Error types for the protocol layer.

/// Errors from encoding or decoding wire messages.
///
/// Decode failures are expected traffic (both ends discard malformed
/// JSON silently), so callers typically log at debug and move on.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A value could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// Incoming bytes were not a valid message.
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),
}
