//! Session model and its stage transitions.
//!
//! Fields are private: every change goes through a transition method that checks the stage, so
//! `persona_key` is always set before `variants`, `variants` is never empty, and `final_text`
//! never changes once chosen.

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Opaque session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Where a session is in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Text captured, waiting for a persona pick.
    AwaitingPersona,
    /// Persona picked, generator call in flight.
    Generating,
    /// Variants stored, waiting for a pick.
    AwaitingVariant,
    /// Final text chosen, waiting for publish.
    AwaitingConfirm,
    /// Publisher call in flight.
    Publishing,
}

impl Stage {
    /// A generator or publisher call owns the session right now.
    pub fn is_busy(self) -> bool {
        matches!(self, Stage::Generating | Stage::Publishing)
    }
}

/// A transition that the current stage does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("another action is in progress ({0:?})")]
    InProgress(Stage),
    #[error("variants were already generated")]
    AlreadyGenerated,
    #[error("no persona selected")]
    PersonaNotSelected,
    #[error("no variants to choose from")]
    NoVariants,
    #[error("variant {index} out of range ({len} available)")]
    VariantOutOfRange { index: usize, len: usize },
    #[error("final text already chosen")]
    AlreadyFinal,
    #[error("no final text chosen")]
    NoFinalText,
    #[error("unexpected stage {0:?}")]
    WrongStage(Stage),
}

/// Ephemeral per-request workflow state.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    scope: i64,
    original_text: String,
    created_at: DateTime<Utc>,
    stage: Stage,
    persona_key: Option<String>,
    variants: Option<Vec<String>>,
    selected_index: Option<usize>,
    final_text: Option<String>,
}

impl Session {
    pub(crate) fn new(id: SessionId, scope: i64, original_text: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            scope,
            original_text,
            created_at,
            stage: Stage::AwaitingPersona,
            persona_key: None,
            variants: None,
            selected_index: None,
            final_text: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Chat the session belongs to.
    pub fn scope(&self) -> i64 {
        self.scope
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn persona_key(&self) -> Option<&str> {
        self.persona_key.as_deref()
    }

    pub fn variants(&self) -> Option<&[String]> {
        self.variants.as_deref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn final_text(&self) -> Option<&str> {
        self.final_text.as_deref()
    }

    /// `now - created_at >= ttl`. A clock that went backwards never expires a session.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: std::time::Duration) -> bool {
        (now - self.created_at)
            .to_std()
            .map(|age| age >= ttl)
            .unwrap_or(false)
    }

    /// AwaitingPersona → Generating, recording the persona.
    pub fn begin_generation(&mut self, persona_key: &str) -> Result<(), SessionError> {
        match self.stage {
            Stage::AwaitingPersona => {
                self.persona_key = Some(persona_key.to_string());
                self.stage = Stage::Generating;
                Ok(())
            }
            Stage::Generating | Stage::Publishing => Err(SessionError::InProgress(self.stage)),
            Stage::AwaitingVariant | Stage::AwaitingConfirm => Err(SessionError::AlreadyGenerated),
        }
    }

    /// Generating → AwaitingPersona after a failed or empty generation; the persona stays recorded.
    pub fn abort_generation(&mut self) {
        if self.stage == Stage::Generating {
            self.stage = Stage::AwaitingPersona;
        }
    }

    /// Generating → AwaitingVariant. `variants` must already be filtered and non-empty.
    pub fn store_variants(&mut self, variants: Vec<String>) -> Result<(), SessionError> {
        if self.stage != Stage::Generating {
            return Err(SessionError::WrongStage(self.stage));
        }
        if self.persona_key.is_none() {
            return Err(SessionError::PersonaNotSelected);
        }
        if variants.is_empty() {
            return Err(SessionError::NoVariants);
        }
        self.variants = Some(variants);
        self.stage = Stage::AwaitingVariant;
        Ok(())
    }

    /// AwaitingVariant → AwaitingConfirm, fixing the final text. Returns the chosen text.
    pub fn select_variant(&mut self, index: usize) -> Result<&str, SessionError> {
        if self.stage.is_busy() {
            return Err(SessionError::InProgress(self.stage));
        }
        if self.final_text.is_some() {
            return Err(SessionError::AlreadyFinal);
        }
        let variants = self.variants.as_ref().ok_or(SessionError::NoVariants)?;
        let chosen = variants
            .get(index)
            .ok_or(SessionError::VariantOutOfRange {
                index,
                len: variants.len(),
            })?
            .clone();
        self.selected_index = Some(index);
        self.stage = Stage::AwaitingConfirm;
        Ok(self.final_text.insert(chosen).as_str())
    }

    /// AwaitingConfirm → Publishing. Returns (persona key, final text) for the publisher.
    pub fn begin_publish(&mut self) -> Result<(String, String), SessionError> {
        let final_text = self.final_text.clone().ok_or(SessionError::NoFinalText)?;
        if self.stage != Stage::AwaitingConfirm {
            return Err(SessionError::InProgress(self.stage));
        }
        let persona_key = self
            .persona_key
            .clone()
            .ok_or(SessionError::PersonaNotSelected)?;
        self.stage = Stage::Publishing;
        Ok((persona_key, final_text))
    }

    /// Publishing → AwaitingConfirm after a failed publish so the same confirm action can retry.
    pub fn abort_publish(&mut self) {
        if self.stage == Stage::Publishing {
            self.stage = Stage::AwaitingConfirm;
        }
    }
}
