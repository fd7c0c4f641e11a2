//! RelayConfig: BaseConfig + personas + workflow limits + session, publisher and LLM settings.
//! Use load() for env-based loading, then validate() before init.

use anyhow::{Context, Result};
use llm_client::EnvLlmConfig;
use publisher::{OAuth1Credentials, XAccount, DEFAULT_X_API_BASE};
use std::env;
use std::time::Duration;

use super::{BaseConfig, Personas};
use crate::workflow::WorkflowLimits;

/// Session lifetime and background sweep cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// SESSION_TTL_SECS
    pub ttl_secs: u64,
    /// SESSION_SWEEP_SECS; 0 disables the sweeper (expiry stays lazy).
    pub sweep_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 120,
            sweep_secs: 30,
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_secs > 0).then(|| Duration::from_secs(self.sweep_secs))
    }
}

/// X API base and one account per persona whose four `X_*_{n}` credentials are set.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// X_API_BASE
    pub api_base: String,
    pub accounts: Vec<XAccount>,
}

/// Full relay config. Use RelayConfig::load() for env-based loading.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub base: BaseConfig,
    pub personas: Personas,
    pub limits: WorkflowLimits,
    pub session: SessionConfig,
    pub publisher: PublisherConfig,
    pub llm: EnvLlmConfig,
}

impl RelayConfig {
    /// Load full config from environment variables. If `token` is provided it overrides BOT_TOKEN.
    pub fn load(token: Option<String>) -> Result<Self> {
        let base = BaseConfig::load(token)?;
        let personas = Personas::from_env()?;

        let defaults = WorkflowLimits::default();
        let limits = WorkflowLimits {
            publish_max_len: parse_var("PUBLISH_MAX_LEN")?.unwrap_or(defaults.publish_max_len),
            intake_max_len: parse_var("INTAKE_MAX_LEN")?.unwrap_or(defaults.intake_max_len),
        };

        let session_defaults = SessionConfig::default();
        let session = SessionConfig {
            ttl_secs: parse_var("SESSION_TTL_SECS")?.unwrap_or(session_defaults.ttl_secs),
            sweep_secs: parse_var("SESSION_SWEEP_SECS")?.unwrap_or(session_defaults.sweep_secs),
        };

        let mut accounts = Vec::new();
        for (i, persona) in personas.iter().enumerate() {
            if let Some(credentials) = x_credentials(i + 1)? {
                accounts.push(XAccount {
                    persona_key: persona.key.clone(),
                    credentials,
                });
            }
        }
        let publisher = PublisherConfig {
            api_base: env::var("X_API_BASE").unwrap_or_else(|_| DEFAULT_X_API_BASE.to_string()),
            accounts,
        };

        let llm = EnvLlmConfig::from_env()?;

        Ok(Self {
            base,
            personas,
            limits,
            session,
            publisher,
            llm,
        })
    }

    /// Validate config. Call after load() to fail fast before init.
    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        self.personas.validate()?;
        self.limits.validate()?;
        if self.session.ttl_secs == 0 {
            anyhow::bail!("SESSION_TTL_SECS must be positive");
        }
        if reqwest::Url::parse(&self.publisher.api_base).is_err() {
            anyhow::bail!("X_API_BASE is not a valid URL: {}", self.publisher.api_base);
        }
        for persona in self.personas.iter() {
            if let Some(channel) = &persona.mirror_channel {
                if !channel.starts_with('@') && channel.parse::<i64>().is_err() {
                    anyhow::bail!(
                        "mirror channel for persona '{}' must be a numeric chat id or @username: {}",
                        persona.key,
                        channel
                    );
                }
            }
        }
        self.llm.validate()
    }

    /// Persona keys with no publishing credentials; publishing for them will fail.
    pub fn personas_without_credentials(&self) -> Vec<&str> {
        self.personas
            .iter()
            .filter(|p| !self.publisher.accounts.iter().any(|a| a.persona_key == p.key))
            .map(|p| p.key.as_str())
            .collect()
    }

    // --- Base config getters ---
    pub fn bot_token(&self) -> &str {
        &self.base.bot_token
    }
    pub fn log_file(&self) -> &str {
        &self.base.log_file
    }
    pub fn telegram_api_url(&self) -> Option<&str> {
        self.base.telegram_api_url.as_deref()
    }
    pub fn operator_id(&self) -> i64 {
        self.base.operator_id
    }
}

/// The n-th persona's OAuth 1.0a credentials: `X_API_KEY_{n}`, `X_API_KEY_SECRET_{n}`,
/// `X_ACCESS_TOKEN_{n}`, `X_ACCESS_TOKEN_SECRET_{n}`. None when all four are unset; an error when
/// only some are.
fn x_credentials(n: usize) -> Result<Option<OAuth1Credentials>> {
    let names = [
        format!("X_API_KEY_{}", n),
        format!("X_API_KEY_SECRET_{}", n),
        format!("X_ACCESS_TOKEN_{}", n),
        format!("X_ACCESS_TOKEN_SECRET_{}", n),
    ];
    let values: Vec<Option<String>> = names
        .iter()
        .map(|name| env::var(name).ok().filter(|v| !v.trim().is_empty()))
        .collect();

    let missing: Vec<&str> = names
        .iter()
        .zip(&values)
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name.as_str())
        .collect();
    if missing.len() == names.len() {
        return Ok(None);
    }
    if !missing.is_empty() {
        anyhow::bail!("incomplete X credentials for persona {}: missing {}", n, missing.join(", "));
    }

    let mut values = values.into_iter().flatten();
    let mut next = || values.next().unwrap_or_default();
    Ok(Some(OAuth1Credentials {
        consumer_key: next(),
        consumer_secret: next(),
        access_token: next(),
        access_token_secret: next(),
    }))
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        _ => Ok(None),
    }
}
