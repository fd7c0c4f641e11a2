//! Outbound reply: display text plus an ordered list of labeled actions.
//! Transports decide how to draw actions (Telegram: one inline button per row).

use serde::{Deserialize, Serialize};

/// How the reply text should be interpreted by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextFormat {
    #[default]
    Plain,
    /// Telegram-style HTML subset; callers are responsible for escaping user text.
    Html,
}

/// A labeled action; `token` is returned verbatim in the resulting action event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub label: String,
    pub token: String,
}

impl Action {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }
}

/// Text + actions to send to a chat.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub actions: Vec<Action>,
    pub format: TextFormat,
}

impl Reply {
    /// Plain text without actions.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            actions: Vec::new(),
            format: TextFormat::Plain,
        }
    }

    /// HTML text without actions.
    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            actions: Vec::new(),
            format: TextFormat::Html,
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Labels in order; convenient in tests and logs.
    pub fn action_labels(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.label.as_str()).collect()
    }
}
