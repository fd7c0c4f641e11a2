//! Error types for the relay core.

use thiserror::Error;

/// Top-level error for responders and handlers.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Sending through the transport failed.
    #[error("Bot error: {0}")]
    Bot(String),

    /// A channel destination that is neither a numeric chat id nor `@username`.
    #[error("Invalid channel: {0}")]
    InvalidChannel(String),
}

/// Result type for core operations; uses [`RelayError`].
pub type Result<T> = std::result::Result<T, RelayError>;
