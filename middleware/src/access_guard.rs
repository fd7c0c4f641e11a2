use async_trait::async_trait;
use relay_core::{Event, Middleware, Result};
use tracing::{instrument, warn};

/// Single-operator authorization. Events from anyone else are dropped before any handler runs:
/// no state change, no reply, only a `warn` audit line.
#[derive(Debug, Clone, Copy)]
pub struct AccessGuard {
    operator_id: i64,
}

impl AccessGuard {
    pub fn new(operator_id: i64) -> Self {
        Self { operator_id }
    }

    pub fn is_authorized(&self, user_id: i64) -> bool {
        user_id == self.operator_id
    }
}

#[async_trait]
impl Middleware for AccessGuard {
    #[instrument(skip(self, event))]
    async fn before(&self, event: &Event) -> Result<bool> {
        if self.is_authorized(event.user.id) {
            return Ok(true);
        }
        warn!(
            user_id = event.user.id,
            username = %event.user.username.as_deref().unwrap_or("unknown"),
            chat_id = event.chat.id,
            kind = event.kind_label(),
            "Unauthorized access attempt"
        );
        Ok(false)
    }
}
