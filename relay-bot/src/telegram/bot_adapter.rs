//! Wraps teloxide::Bot and implements [`relay_core::Bot`]. Production code sends messages via
//! Telegram; tests substitute another Bot impl.

use async_trait::async_trait;
use relay_core::{Action, Bot as CoreBot, Chat, RelayError, Reply, Result, TextFormat};
use teloxide::{
    prelude::*,
    types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, Recipient},
};
use tracing::debug;

/// Thin wrapper around teloxide::Bot that implements core's Bot trait.
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    /// Creates an adapter from an existing teloxide Bot.
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }
}

/// One button per row, in order.
fn keyboard(actions: &[Action]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(actions.iter().map(|action| {
        vec![InlineKeyboardButton::callback(
            action.label.clone(),
            action.token.clone(),
        )]
    }))
}

/// `@name` → channel username, otherwise a numeric chat id (`-100...` for channels).
pub fn parse_channel(channel: &str) -> Result<Recipient> {
    let channel = channel.trim();
    if channel.len() > 1 && channel.starts_with('@') {
        return Ok(Recipient::ChannelUsername(channel.to_string()));
    }
    channel
        .parse::<i64>()
        .map(|id| Recipient::Id(ChatId(id)))
        .map_err(|_| RelayError::InvalidChannel(channel.to_string()))
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send_reply(&self, chat: &Chat, reply: &Reply) -> Result<()> {
        let mut request = self.bot.send_message(ChatId(chat.id), reply.text.clone());
        if reply.format == TextFormat::Html {
            request = request.parse_mode(ParseMode::Html);
        }
        if !reply.actions.is_empty() {
            request = request.reply_markup(keyboard(&reply.actions));
        }
        request
            .await
            .map_err(|e| RelayError::Bot(e.to_string()))?;
        debug!(chat_id = chat.id, actions = reply.actions.len(), "Reply sent");
        Ok(())
    }

    async fn send_to_channel(&self, channel: &str, text: &str) -> Result<()> {
        let recipient = parse_channel(channel)?;
        self.bot
            .send_message(recipient, text.to_string())
            .await
            .map_err(|e| RelayError::Bot(e.to_string()))?;
        Ok(())
    }
}
