//! Inbound events: free text typed by a user, or an action (button press) carrying an opaque token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{chat::Chat, user::User};

/// What the user did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A text message (may be a `/command`).
    Text(String),
    /// A pressed action; the payload is the token the action was rendered with.
    Action(String),
}

/// A single inbound event with its originating user and chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Transport id (message id or callback query id).
    pub id: String,
    pub user: User,
    pub chat: Chat,
    pub kind: EventKind,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Text intake event.
    pub fn text(id: impl Into<String>, user: User, chat: Chat, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user,
            chat,
            kind: EventKind::Text(text.into()),
            created_at: Utc::now(),
        }
    }

    /// Action event carrying an opaque token.
    pub fn action(id: impl Into<String>, user: User, chat: Chat, token: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user,
            chat,
            kind: EventKind::Action(token.into()),
            created_at: Utc::now(),
        }
    }

    /// Short label for logs ("text" / "action").
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            EventKind::Text(_) => "text",
            EventKind::Action(_) => "action",
        }
    }
}
