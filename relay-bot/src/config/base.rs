//! Base config: Telegram Bot connection, logging, operator identity. Loaded from env.

use anyhow::{Context, Result};
use std::env;

/// Base config: Telegram-related, logging and the single authorized operator.
#[derive(Debug, Clone)]
pub struct BaseConfig {
    /// BOT_TOKEN
    pub bot_token: String,
    /// TELEGRAM_API_URL or TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    /// Log file path
    pub log_file: String,
    /// OPERATOR_USER_ID or ALLOWED_USER_ID
    pub operator_id: i64,
}

impl BaseConfig {
    /// Load from environment variables. `token` overrides BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(token) => token,
            None => env::var("BOT_TOKEN").context("BOT_TOKEN not set")?,
        };
        let log_file =
            env::var("LOG_FILE").unwrap_or_else(|_| "logs/persona-relay.log".to_string());
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        let operator_raw = env::var("OPERATOR_USER_ID")
            .or_else(|_| env::var("ALLOWED_USER_ID"))
            .context("OPERATOR_USER_ID (or ALLOWED_USER_ID) not set")?;
        let operator_id = operator_raw.trim().parse::<i64>().with_context(|| {
            format!("OPERATOR_USER_ID must be a numeric Telegram user id: {}", operator_raw)
        })?;

        Ok(Self {
            bot_token,
            telegram_api_url,
            log_file,
            operator_id,
        })
    }

    /// Validate config (e.g. telegram_api_url must be valid URL if set).
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("BOT_TOKEN is empty");
        }
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                anyhow::bail!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                    url_str
                );
            }
        }
        Ok(())
    }
}
