//! Telegram update → core [`Event`] converters.

use relay_core::{Chat, Event, ToCoreEvent, ToCoreUser, User};

/// Telegram user → core user.
pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl<'a> ToCoreUser for TelegramUserWrapper<'a> {
    fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            username: self.0.username.clone(),
            first_name: Some(self.0.first_name.clone()),
            last_name: self.0.last_name.clone(),
        }
    }
}

fn core_chat(chat: &teloxide::types::Chat) -> Chat {
    Chat {
        id: chat.id.0,
        chat_type: format!("{:?}", chat.kind),
    }
}

/// Telegram message → text event. Messages without text (photos, stickers, ...) yield `None`.
pub struct TelegramMessageWrapper<'a>(pub &'a teloxide::types::Message);

impl<'a> ToCoreEvent for TelegramMessageWrapper<'a> {
    fn to_core(&self) -> Option<Event> {
        let text = self.0.text()?;
        let user = self
            .0
            .from
            .as_ref()
            .map(|u| TelegramUserWrapper(u).to_core())
            .unwrap_or_else(|| User::anonymous(0));
        Some(Event::text(
            self.0.id.to_string(),
            user,
            core_chat(&self.0.chat),
            text,
        ))
    }
}

/// Telegram callback query → action event carrying the button's callback data.
/// Queries without data yield `None`; when the originating message is gone the sender's
/// private chat is used.
pub struct TelegramCallbackWrapper<'a>(pub &'a teloxide::types::CallbackQuery);

impl<'a> ToCoreEvent for TelegramCallbackWrapper<'a> {
    fn to_core(&self) -> Option<Event> {
        let data = self.0.data.as_deref()?;
        let user = TelegramUserWrapper(&self.0.from).to_core();
        let chat = self
            .0
            .message
            .as_ref()
            .map(|m| core_chat(m.chat()))
            .unwrap_or_else(|| Chat::private(user.id));
        Some(Event::action(self.0.id.to_string(), user, chat, data))
    }
}
