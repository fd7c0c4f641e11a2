//! # publisher
//!
//! [`Publisher`] posts a finished text on behalf of a persona and returns the public URL.
//! [`XPublisher`] implements it against the X API v2 (`POST /2/tweets`).

use async_trait::async_trait;
use thiserror::Error;

mod oauth1;
mod x;

pub use oauth1::OAuth1Credentials;
pub use x::{XAccount, XPublisher, DEFAULT_X_API_BASE};

/// Why a publish attempt failed. The `Display` text is shown to the operator.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("no publishing account configured for persona '{0}'")]
    NotConfigured(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("could not sign request: {0}")]
    Signing(String),

    #[error("unexpected API response: {0}")]
    InvalidResponse(String),
}

/// Posts text for a persona; one attempt, no retries.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns the public URL of the created post.
    async fn publish(&self, persona_key: &str, text: &str) -> Result<String, PublishError>;
}
