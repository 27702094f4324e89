//! Shared error types for the actor bridge.

use crate::selection::CancelReason;
use thiserror::Error;

/// Top-level error type for every bridge operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The delivery endpoint for the remote surface does not exist yet.
    #[error("Channel not ready: {0}")]
    ChannelNotReady(String),

    /// Text could not be decoded by the codec.
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),

    /// An actor reference or raw public key is not usable.
    #[error("Malformed actor reference: {0}")]
    MalformedActorReference(String),

    /// The remote surface answered with an explicit error.
    ///
    /// The reason is the remote's text, passed through untouched.
    #[error("Remote operation failed: {0}")]
    RemoteOperationFailed(String),

    /// A pending request was released without an outcome.
    #[error("No reply")]
    NoReply,

    /// The user dismissed the actor picker.
    #[error("Selection canceled: {0}")]
    SelectionCanceled(CancelReason),

    /// No reply arrived within the configured bound.
    #[error("Timed out after {secs}s waiting for '{action}' reply")]
    Timeout {
        /// Wire action of the request.
        action: String,
        /// The bound that expired.
        secs: u64,
    },

    /// A message was addressed to an origin the remote endpoint is not at.
    #[error("Origin rejected: addressed to '{requested}', endpoint is at '{endpoint}'")]
    OriginRejected {
        /// The origin the sender restricted delivery to.
        requested: String,
        /// The origin the remote endpoint actually lives at.
        endpoint: String,
    },

    /// Too many requests are waiting for replies.
    #[error("Too many pending requests (max {0})")]
    TooManyPending(usize),

    /// A wire message could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Bridge configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The bridge has been torn down.
    #[error("Shutdown in progress")]
    ShuttingDown,

    /// An internal consistency check failed.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// True when the error reflects a user decision rather than a fault.
    pub fn is_user_declined(&self) -> bool {
        matches!(self, BridgeError::SelectionCanceled(_))
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        BridgeError::Serialization(e.to_string())
    }
}

/// Alias for Result with BridgeError.
pub type BridgeResult<T> = Result<T, BridgeError>;
