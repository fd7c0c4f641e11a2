//! Long-polling dispatcher: converts messages and callback queries to core events and passes them
//! to the HandlerChain, one spawned task per update.

use anyhow::Result;
use handler_chain::HandlerChain;
use middleware::AccessGuard;
use relay_core::{Event, ToCoreEvent, ToCoreUser};
use teloxide::{
    dptree,
    prelude::*,
    types::{CallbackQuery, Message, Update},
};
use tracing::{debug, error, info, instrument, warn};

use super::adapters::{TelegramCallbackWrapper, TelegramMessageWrapper, TelegramUserWrapper};

/// Runs the chain in its own task so a slow generator or publisher call blocks only this update.
fn spawn_chain(chain: HandlerChain, event: Event) {
    tokio::spawn(async move {
        info!(
            user_id = event.user.id,
            chat_id = event.chat.id,
            event_id = %event.id,
            kind = event.kind_label(),
            "step: processing event (handler chain started)"
        );
        if let Err(e) = chain.handle(&event).await {
            error!(error = %e, user_id = event.user.id, "Handler chain failed");
        }
    });
}

async fn on_message(msg: Message, chain: HandlerChain) -> ResponseResult<()> {
    match TelegramMessageWrapper(&msg).to_core() {
        Some(event) => spawn_chain(chain, event),
        None => debug!(chat_id = msg.chat.id.0, "Received non-text message"),
    }
    Ok(())
}

/// Only the operator's callbacks are acknowledged; anyone else gets no transport response at all.
fn should_answer(guard: &AccessGuard, sender_id: i64) -> bool {
    guard.is_authorized(sender_id)
}

async fn on_callback(
    bot: Bot,
    query: CallbackQuery,
    chain: HandlerChain,
    guard: AccessGuard,
) -> ResponseResult<()> {
    let sender = TelegramUserWrapper(&query.from).to_core();
    if should_answer(&guard, sender.id) {
        // Stops the client-side spinner; the outcome is delivered as a regular message.
        if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
            warn!(error = %e, "Failed to answer callback query");
        }
    }
    match TelegramCallbackWrapper(&query).to_core() {
        Some(event) => spawn_chain(chain, event),
        None => debug!(user_id = query.from.id.0, "Callback query without data"),
    }
    Ok(())
}

/// Dispatches messages and callback queries until Ctrl-C. Calls get_me() first to log the bot
/// username.
#[instrument(skip(bot, handler_chain))]
pub async fn run_dispatcher(
    bot: teloxide::Bot,
    handler_chain: HandlerChain,
    guard: AccessGuard,
) -> Result<()> {
    if let Ok(me) = bot.get_me().await {
        if let Some(username) = &me.user.username {
            info!(username = %username, "Bot username resolved");
        }
    }

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![handler_chain, guard])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
