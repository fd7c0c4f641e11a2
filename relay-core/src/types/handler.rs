//! Handler and Middleware traits, plus transport conversion traits.

use async_trait::async_trait;

use super::{event::Event, response::HandlerResponse, user::User};
use crate::error::Result;

/// Converts a transport-specific user type to core [`User`].
pub trait ToCoreUser: Send + Sync {
    fn to_core(&self) -> User;
}

/// Converts a transport-specific update to a core [`Event`]. `None` when the update carries nothing the core handles.
pub trait ToCoreEvent: Send + Sync {
    fn to_core(&self) -> Option<Event>;
}

/// Single handler concept: optional before / handle / after. Chain runs all before → handle until Stop/Reply → all after (reverse).
#[async_trait]
pub trait Handler: Send + Sync {
    /// Runs before the handle phase. Return false to stop the chain.
    async fn before(&self, _event: &Event) -> Result<bool> {
        Ok(true)
    }
    /// Processes the event. Return Stop or Reply to end the handle phase. Default: Continue.
    async fn handle(&self, _event: &Event) -> Result<HandlerResponse> {
        Ok(HandlerResponse::Continue)
    }
    /// Runs after the handle phase (reverse order), with the final response.
    async fn after(&self, _event: &Event, _response: &HandlerResponse) -> Result<()> {
        Ok(())
    }
}

/// Cross-cutting step around the handlers (logging, access control).
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Return false to drop the event; no handler runs.
    async fn before(&self, event: &Event) -> Result<bool>;
    async fn after(&self, _event: &Event, _response: &HandlerResponse) -> Result<()> {
        Ok(())
    }
}
