//! # Handler chain
//!
//! One pass per [`Event`]: the gate (every middleware `before`, then every handler `before`), the
//! dispatch (handlers in order until one answers), then `after` hooks in reverse. A closed gate
//! yields [`HandlerResponse::Stop`] and skips the `after` hooks entirely, so a dropped event
//! leaves no trace beyond the log line.

use relay_core::{Event, Handler, HandlerResponse, Middleware, Result};
use std::any::type_name_of_val;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Middleware and handlers run for every event; cheap to clone (shared `Arc`s).
#[derive(Clone, Default)]
pub struct HandlerChain {
    middleware: Vec<Arc<dyn Middleware>>,
    handlers: Vec<Arc<dyn Handler>>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware. Its `before` runs ahead of every handler; its `after` runs last.
    pub fn add_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Appends a handler. Handlers are tried in insertion order.
    pub fn add_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Runs the event through the chain. Returns `Stop` if the gate closed, the first `Stop` or
    /// `Reply` from a handler, or `Continue` when no handler answered.
    #[instrument(skip(self, event), fields(event_id = %event.id, kind = event.kind_label()))]
    pub async fn handle(&self, event: &Event) -> Result<HandlerResponse> {
        info!(
            user_id = event.user.id,
            chat_id = event.chat.id,
            "step: handler_chain started"
        );

        if let Some(stopped_by) = self.gate(event).await? {
            info!(
                user_id = event.user.id,
                stopped_by = %stopped_by,
                "step: before hook returned false, chain stopped"
            );
            return Ok(HandlerResponse::Stop);
        }

        let response = self.dispatch(event).await?;

        for handler in self.handlers.iter().rev() {
            handler.after(event, &response).await?;
        }
        for mw in self.middleware.iter().rev() {
            mw.after(event, &response).await?;
        }

        info!(
            user_id = event.user.id,
            chat_id = event.chat.id,
            outcome = outcome_label(&response),
            "step: handler_chain finished"
        );
        Ok(response)
    }

    /// Name of the first middleware or handler whose `before` refused the event.
    async fn gate(&self, event: &Event) -> Result<Option<&'static str>> {
        for mw in &self.middleware {
            let name = type_name_of_val(mw.as_ref());
            if !mw.before(event).await? {
                return Ok(Some(name));
            }
            debug!(middleware = %name, "step: middleware before done");
        }
        for handler in &self.handlers {
            if !handler.before(event).await? {
                return Ok(Some(type_name_of_val(handler.as_ref())));
            }
        }
        Ok(None)
    }

    async fn dispatch(&self, event: &Event) -> Result<HandlerResponse> {
        for handler in &self.handlers {
            let response = handler.handle(event).await?;
            debug!(
                handler = %type_name_of_val(handler.as_ref()),
                outcome = outcome_label(&response),
                "step: handler done"
            );
            if matches!(response, HandlerResponse::Stop | HandlerResponse::Reply(_)) {
                return Ok(response);
            }
        }
        Ok(HandlerResponse::Continue)
    }
}

fn outcome_label(response: &HandlerResponse) -> &'static str {
    match response {
        HandlerResponse::Continue => "continue",
        HandlerResponse::Stop => "stop",
        HandlerResponse::Ignore => "ignore",
        HandlerResponse::Reply(_) => "reply",
    }
}

// Tests live in tests/handler_chain_test.rs
