//! Bot abstraction for sending replies.
//!
//! [`Bot`] is transport-agnostic; relay-bot implements it over teloxide and tests substitute a recorder.

use crate::error::Result;
use crate::types::{Chat, Reply};
use async_trait::async_trait;

/// Outbound responder. Implementations map to a transport (e.g. Telegram).
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends a reply (text, format and actions) to the given chat.
    async fn send_reply(&self, chat: &Chat, reply: &Reply) -> Result<()>;
    /// Sends plain text to a broadcast channel, addressed by numeric id or `@username`.
    async fn send_to_channel(&self, channel: &str, text: &str) -> Result<()>;
}
