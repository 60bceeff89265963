//! Error types for chanwire.

use thiserror::Error;

/// Main error type for all chanwire operations.
#[derive(Debug, Error)]
pub enum WireError {
    /// I/O error raised by a transport implementation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failure reported by the underlying transport, propagated unchanged.
    #[error("transport error: {0}")]
    Transport(String),

    /// No backend function is registered under the requested name.
    #[error("no backend function registered for: {0}")]
    FuncNotFound(String),

    /// A channel reference string did not carry the expected tag.
    #[error("invalid channel reference: {0}")]
    InvalidChannelRef(String),

    /// The channel was already closed when a send was attempted.
    #[error("channel closed")]
    ChannelClosed,

    /// The transport answered with a shape the invocation layer never
    /// produces. This is an integration defect, not a caller error.
    #[error("contract violation: {0}")]
    ContractViolation(String),
}

/// Result type alias using WireError.
pub type Result<T> = std::result::Result<T, WireError>;
