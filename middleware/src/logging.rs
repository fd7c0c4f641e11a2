use async_trait::async_trait;
use relay_core::{Event, EventKind, HandlerResponse, Middleware, Result};
use tracing::{debug, info, instrument};

/// Logs each event in before() and the response in after(); always continues.
pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
    #[instrument(skip(self, event))]
    async fn before(&self, event: &Event) -> Result<bool> {
        match &event.kind {
            EventKind::Text(text) => info!(
                user_id = event.user.id,
                chat_id = event.chat.id,
                username = %event.user.username.as_deref().unwrap_or("unknown"),
                text_len = text.chars().count(),
                "Received text"
            ),
            EventKind::Action(token) => info!(
                user_id = event.user.id,
                chat_id = event.chat.id,
                username = %event.user.username.as_deref().unwrap_or("unknown"),
                token = %token,
                "Received action"
            ),
        }
        Ok(true)
    }

    #[instrument(skip(self, event, response))]
    async fn after(&self, event: &Event, response: &HandlerResponse) -> Result<()> {
        debug!(
            event_id = %event.id,
            response = ?response,
            "Processed event"
        );
        Ok(())
    }
}
