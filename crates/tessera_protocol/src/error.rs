//! Protocol errors.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding or decoding frames and payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A frame could not be serialized.
    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),

    /// A frame is not valid JSON or not a known message.
    #[error("failed to decode frame: {0}")]
    Decode(#[source] serde_json::Error),

    /// A blank line was read where a frame was expected.
    #[error("empty frame")]
    EmptyFrame,

    /// A payload does not have the shape its operation expects.
    #[error("invalid payload for {op}: {source}")]
    InvalidPayload {
        /// The operation whose payload was rejected.
        op: String,
        /// The decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// Writing a frame to the channel failed.
    #[error("failed to write frame: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Returns true if the error is about the peer's input rather than ours.
    pub fn is_peer_error(&self) -> bool {
        matches!(
            self,
            ProtocolError::Decode(_)
                | ProtocolError::EmptyFrame
                | ProtocolError::InvalidPayload { .. }
        )
    }
}
