//! [`RelayWorkflow`]: the handler that drives a session from intake to publish.
//!
//! Stage changes go through [`SessionStore::update`], so each claim is atomic. The store lock is
//! never held across generator or publisher calls: the session is moved to `Generating` or
//! `Publishing` first, and a second click on the same button while that call runs gets
//! [`WorkflowError::ActionInProgress`].

use async_trait::async_trait;
use callback_token::{CallbackToken, TokenError, MAX_TOKEN_BYTES};
use publisher::Publisher;
use relay_core::{Bot, Chat, Event, EventKind, Handler, HandlerResponse, Reply, Result};
use session_store::{SessionError, SessionStore};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::{filter_within_limit, text_len, WorkflowError, WorkflowLimits};
use crate::config::Personas;
use crate::generator::VariantGenerator;
use crate::presenter::{self, MirrorStatus};

const START_COMMAND: &str = "/start";

/// Session workflow handler. Expects [`middleware::AccessGuard`] to run first in the chain.
pub struct RelayWorkflow {
    store: Arc<SessionStore>,
    personas: Arc<Personas>,
    generator: Arc<dyn VariantGenerator>,
    publisher: Arc<dyn Publisher>,
    bot: Arc<dyn Bot>,
    limits: WorkflowLimits,
}

impl RelayWorkflow {
    pub fn new(
        store: Arc<SessionStore>,
        personas: Arc<Personas>,
        generator: Arc<dyn VariantGenerator>,
        publisher: Arc<dyn Publisher>,
        bot: Arc<dyn Bot>,
        limits: WorkflowLimits,
    ) -> Self {
        Self {
            store,
            personas,
            generator,
            publisher,
            bot,
            limits,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    async fn respond(&self, chat: &Chat, reply: Reply) -> Result<HandlerResponse> {
        let reply = match presenter::oversized_token(&reply) {
            Some(token) => {
                error!(
                    chat_id = chat.id,
                    token_len = token.len(),
                    limit = MAX_TOKEN_BYTES,
                    "Action token exceeds callback payload limit"
                );
                presenter::error(&WorkflowError::Unexpected("oversized action token".to_string()))
            }
            None => reply,
        };
        self.bot.send_reply(chat, &reply).await?;
        Ok(HandlerResponse::Reply(reply.text))
    }

    /// Progress notices are best effort; a failed send must not strand a claimed session.
    async fn notify(&self, chat: &Chat, reply: Reply) {
        if let Err(e) = self.bot.send_reply(chat, &reply).await {
            warn!(error = %e, chat_id = chat.id, "Failed to send progress notice");
        }
    }

    async fn fail(&self, chat: &Chat, err: WorkflowError) -> Result<HandlerResponse> {
        match (err.cause(), &err) {
            (Some(cause), WorkflowError::PublishFailure(_)) => {
                warn!(chat_id = chat.id, error = %cause, "Publish failed");
            }
            (Some(cause), _) => error!(chat_id = chat.id, error = %cause, "Workflow step failed"),
            (None, _) => info!(chat_id = chat.id, reason = %err, "Workflow step rejected"),
        }
        self.respond(chat, presenter::error(&err)).await
    }

    #[instrument(skip(self, chat, text), fields(chat_id = chat.id))]
    async fn on_text(&self, chat: &Chat, text: &str) -> Result<HandlerResponse> {
        let trimmed = text.trim();
        if is_start_command(text) {
            return self.respond(chat, presenter::welcome()).await;
        }
        // Only text that itself begins with '/' is a command; " /x" is ordinary intake.
        if trimmed.is_empty() || text.starts_with('/') {
            debug!("Ignoring command or empty text");
            return Ok(HandlerResponse::Ignore);
        }
        if text_len(text) > self.limits.intake_max_len {
            return self
                .fail(
                    chat,
                    WorkflowError::InputTooLong {
                        max: self.limits.intake_max_len,
                    },
                )
                .await;
        }

        let session = self.store.create(chat.id, text).await;
        info!(session_id = %session.id(), text_len = text_len(text), "step: session created");
        let reply = presenter::persona_menu(session.id().as_str(), text, &self.personas);
        self.respond(chat, reply).await
    }

    #[instrument(skip(self, chat))]
    async fn select_persona(&self, chat: &Chat, session_id: &str, index: usize) -> Result<HandlerResponse> {
        let Some(persona) = self.personas.at(index) else {
            warn!(index, "Persona index out of range (stale menu)");
            return self.fail(chat, WorkflowError::SessionExpiredOrMissing).await;
        };

        let claim = self
            .store
            .update(session_id, |s| {
                s.begin_generation(&persona.key)
                    .map(|()| s.original_text().to_string())
            })
            .await;
        let original_text = match claim {
            None => return self.fail(chat, WorkflowError::SessionExpiredOrMissing).await,
            Some(Err(SessionError::InProgress(_))) => {
                return self.fail(chat, WorkflowError::ActionInProgress).await
            }
            Some(Err(SessionError::AlreadyGenerated)) => {
                return self.represent_variants(chat, session_id).await
            }
            Some(Err(e)) => return self.fail(chat, WorkflowError::Unexpected(e.to_string())).await,
            Some(Ok(text)) => text,
        };
        info!(persona = %persona.key, "step: generating variants");

        self.notify(chat, presenter::generating(persona)).await;

        let generated = match self.generator.generate(&original_text, &persona.style).await {
            Ok(variants) => variants,
            Err(e) => {
                self.store.update(session_id, |s| s.abort_generation()).await;
                return self
                    .fail(chat, WorkflowError::GenerationFailure(format!("{:#}", e)))
                    .await;
            }
        };
        let generated_count = generated.len();
        let variants = filter_within_limit(generated, self.limits.publish_max_len);
        info!(
            generated = generated_count,
            kept = variants.len(),
            limit = self.limits.publish_max_len,
            "step: variants filtered"
        );

        if variants.is_empty() {
            self.store.update(session_id, |s| s.abort_generation()).await;
            return self.fail(chat, WorkflowError::AllVariantsTooLong).await;
        }

        let stored = self
            .store
            .update(session_id, |s| s.store_variants(variants.clone()))
            .await;
        match stored {
            None => self.fail(chat, WorkflowError::SessionExpiredOrMissing).await,
            Some(Err(e)) => self.fail(chat, WorkflowError::Unexpected(e.to_string())).await,
            Some(Ok(())) => {
                let reply = presenter::variant_menu(
                    session_id,
                    persona,
                    &variants,
                    self.limits.publish_max_len,
                );
                self.respond(chat, reply).await
            }
        }
    }

    /// Persona clicked again after generation: show the existing variants instead of regenerating.
    async fn represent_variants(&self, chat: &Chat, session_id: &str) -> Result<HandlerResponse> {
        let Some(session) = self.store.get(session_id).await else {
            return self.fail(chat, WorkflowError::SessionExpiredOrMissing).await;
        };
        let persona = session.persona_key().and_then(|key| self.personas.get(key));
        match (persona, session.variants()) {
            (Some(persona), Some(variants)) => {
                let reply = presenter::variant_menu(
                    session_id,
                    persona,
                    variants,
                    self.limits.publish_max_len,
                );
                self.respond(chat, reply).await
            }
            _ => self.fail(chat, WorkflowError::SessionExpiredOrMissing).await,
        }
    }

    #[instrument(skip(self, chat))]
    async fn select_variant(&self, chat: &Chat, session_id: &str, index: usize) -> Result<HandlerResponse> {
        let outcome = self
            .store
            .update(session_id, |s| {
                let selected = match s.select_variant(index).map(str::to_string) {
                    Ok(text) => (index, text),
                    // Already chosen: keep it and show the same confirmation again.
                    Err(SessionError::AlreadyFinal) => (
                        s.selected_index().unwrap_or(index),
                        s.final_text().unwrap_or_default().to_string(),
                    ),
                    Err(e) => return Err(e),
                };
                Ok((s.persona_key().unwrap_or_default().to_string(), selected))
            })
            .await;

        let (persona_key, (chosen_index, final_text)) = match outcome {
            None | Some(Err(SessionError::NoVariants)) => {
                return self.fail(chat, WorkflowError::SessionExpiredOrMissing).await
            }
            Some(Err(SessionError::VariantOutOfRange { .. })) => {
                return self.fail(chat, WorkflowError::VariantNotFound).await
            }
            Some(Err(SessionError::InProgress(_))) => {
                return self.fail(chat, WorkflowError::ActionInProgress).await
            }
            Some(Err(e)) => return self.fail(chat, WorkflowError::Unexpected(e.to_string())).await,
            Some(Ok(selected)) => selected,
        };

        let Some(persona) = self.personas.get(&persona_key) else {
            return self
                .fail(
                    chat,
                    WorkflowError::Unexpected(format!("persona '{}' is not configured", persona_key)),
                )
                .await;
        };
        info!(persona = %persona.key, index = chosen_index, "step: variant selected");
        let reply = presenter::confirm(session_id, persona, chosen_index, &final_text);
        self.respond(chat, reply).await
    }

    #[instrument(skip(self, chat))]
    async fn publish(&self, chat: &Chat, session_id: &str) -> Result<HandlerResponse> {
        let claim = self.store.update(session_id, |s| s.begin_publish()).await;
        let (persona_key, final_text) = match claim {
            None | Some(Err(SessionError::NoFinalText)) => {
                return self.fail(chat, WorkflowError::SessionExpiredOrMissing).await
            }
            Some(Err(SessionError::InProgress(_))) => {
                return self.fail(chat, WorkflowError::ActionInProgress).await
            }
            Some(Err(e)) => return self.fail(chat, WorkflowError::Unexpected(e.to_string())).await,
            Some(Ok(claimed)) => claimed,
        };

        let Some(persona) = self.personas.get(&persona_key) else {
            self.store.update(session_id, |s| s.abort_publish()).await;
            return self
                .fail(
                    chat,
                    WorkflowError::Unexpected(format!("persona '{}' is not configured", persona_key)),
                )
                .await;
        };
        info!(persona = %persona.key, text_len = text_len(&final_text), "step: publishing");

        self.notify(chat, presenter::publishing()).await;

        let url = match self.publisher.publish(&persona.key, &final_text).await {
            Ok(url) => url,
            Err(e) => {
                self.store.update(session_id, |s| s.abort_publish()).await;
                return self.fail(chat, WorkflowError::PublishFailure(e.to_string())).await;
            }
        };
        info!(persona = %persona.key, url = %url, "step: published");

        let mirror = match &persona.mirror_channel {
            Some(channel) => {
                let post = presenter::mirror_post(&final_text, &url);
                match self.bot.send_to_channel(channel, &post).await {
                    Ok(()) => Some(MirrorStatus::Sent),
                    Err(e) => {
                        error!(error = %e, channel = %channel, "Mirror post failed");
                        Some(MirrorStatus::Failed)
                    }
                }
            }
            None => None,
        };

        self.store.delete(session_id).await;
        self.respond(chat, presenter::published(&url, mirror)).await
    }

    #[instrument(skip(self, chat))]
    async fn cancel(&self, chat: &Chat, session_id: &str) -> Result<HandlerResponse> {
        let removed = self.store.delete(session_id).await;
        info!(removed, "step: cancelled");
        self.respond(chat, presenter::cancelled()).await
    }

    async fn on_action(&self, chat: &Chat, raw: &str) -> Result<HandlerResponse> {
        let token = match CallbackToken::decode(raw) {
            Ok(token) => token,
            Err(TokenError::UnknownKind(kind)) => {
                debug!(kind = %kind, "Ignoring unknown callback kind");
                return Ok(HandlerResponse::Ignore);
            }
            Err(e) => {
                warn!(error = %e, "Ignoring undecodable callback token");
                return Ok(HandlerResponse::Ignore);
            }
        };

        match token {
            CallbackToken::SelectPersona {
                session_id,
                persona,
            } => self.select_persona(chat, &session_id, persona).await,
            CallbackToken::SelectVariant { session_id, index } => {
                self.select_variant(chat, &session_id, index).await
            }
            CallbackToken::Publish { session_id } => self.publish(chat, &session_id).await,
            CallbackToken::Cancel { session_id } => self.cancel(chat, &session_id).await,
        }
    }
}

/// `/start`, `/start payload` and `/start@BotName`.
fn is_start_command(text: &str) -> bool {
    match text.strip_prefix(START_COMMAND) {
        Some(rest) => rest.is_empty() || rest.starts_with('@') || rest.starts_with(char::is_whitespace),
        None => false,
    }
}

#[async_trait]
impl Handler for RelayWorkflow {
    #[instrument(skip(self, event), fields(event_id = %event.id, user_id = event.user.id))]
    async fn handle(&self, event: &Event) -> Result<HandlerResponse> {
        match &event.kind {
            EventKind::Text(text) => self.on_text(&event.chat, text).await,
            EventKind::Action(token) => self.on_action(&event.chat, token).await,
        }
    }
}
