//! Telegram framework layer: adapters, Bot implementation, long-polling dispatcher.

mod adapters;
mod bot_adapter;
mod runner;

pub use adapters::{TelegramCallbackWrapper, TelegramMessageWrapper, TelegramUserWrapper};
pub use bot_adapter::{parse_channel, TelegramBotAdapter};
pub use runner::run_dispatcher;
