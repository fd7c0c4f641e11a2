//! Persona registry: an ordered list of publishing identities read from `PERSONA_{n}_*`.

use anyhow::Result;
use std::collections::HashSet;
use std::env;

/// Generation system prompt used when `PERSONA_{n}_STYLE` is not set.
pub const DEFAULT_STYLE: &str = "You are a professional translator and social media copywriter. \
Translate the user's text into natural, fluent English and adapt it into an engaging post for X \
(Twitter). Keep the meaning, keep names and links intact, and do not add hashtags unless the \
original has them.";

/// A named publishing identity with its own generation style and optional mirror channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    /// Stable key; the publisher looks up credentials by it.
    pub key: String,
    /// Display name used in menus.
    pub name: String,
    /// System prompt for the variant generator.
    pub style: String,
    /// Telegram chat id or `@channel` that receives a copy of each published post.
    pub mirror_channel: Option<String>,
}

impl Persona {
    pub fn new(key: impl Into<String>, name: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            style: style.into(),
            mirror_channel: None,
        }
    }

    pub fn with_mirror_channel(mut self, channel: impl Into<String>) -> Self {
        self.mirror_channel = Some(channel.into());
        self
    }
}

/// Immutable, ordered persona lookup table. Menu order follows configuration order.
#[derive(Debug, Clone, Default)]
pub struct Personas {
    list: Vec<Persona>,
}

impl Personas {
    pub fn new(list: Vec<Persona>) -> Self {
        Self { list }
    }

    /// Reads `PERSONA_{n}_KEY`, `PERSONA_{n}_NAME`, `PERSONA_{n}_STYLE`, `PERSONA_{n}_CHANNEL_ID`
    /// for n = 1, 2, ... and stops at the first n with neither a name nor a style.
    pub fn from_env() -> Result<Self> {
        let mut list = Vec::new();
        for n in 1.. {
            let name = non_empty_var(&format!("PERSONA_{}_NAME", n));
            let style = non_empty_var(&format!("PERSONA_{}_STYLE", n));
            if name.is_none() && style.is_none() {
                break;
            }
            let key = non_empty_var(&format!("PERSONA_{}_KEY", n))
                .unwrap_or_else(|| format!("account{}", n));
            let mut persona = Persona::new(
                key,
                name.unwrap_or_else(|| format!("Account {}", n)),
                style.unwrap_or_else(|| DEFAULT_STYLE.to_string()),
            );
            persona.mirror_channel = non_empty_var(&format!("PERSONA_{}_CHANNEL_ID", n));
            list.push(persona);
        }
        Ok(Self { list })
    }

    /// At least one persona; keys unique and non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.list.is_empty() {
            anyhow::bail!("no personas configured: set PERSONA_1_NAME or PERSONA_1_STYLE");
        }
        let mut seen = HashSet::new();
        for persona in &self.list {
            if persona.key.trim().is_empty() {
                anyhow::bail!("persona '{}' has an empty key", persona.name);
            }
            if !seen.insert(persona.key.as_str()) {
                anyhow::bail!("duplicate persona key: {}", persona.key);
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Persona> {
        self.list.iter().find(|p| p.key == key)
    }

    /// Persona at a menu position.
    pub fn at(&self, index: usize) -> Option<&Persona> {
        self.list.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.list.iter()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
