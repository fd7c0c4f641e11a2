//! CLI parser and config loading.

use anyhow::Result;
use clap::{Parser, Subcommand};
use llm_client::mask_token;
use std::fmt::Write;

use crate::config::RelayConfig;

#[derive(Parser)]
#[command(name = "persona-relay")]
#[command(about = "Telegram persona relay: rewrite text per persona and publish to X", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the relay bot (config from env; token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Load and validate config, then print a summary with credentials masked.
    Check {
        #[arg(short, long)]
        token: Option<String>,
    },
}

/// Load RelayConfig from environment. If `token` is provided it overrides BOT_TOKEN.
pub fn load_config(token: Option<String>) -> Result<RelayConfig> {
    RelayConfig::load(token)
}

/// Human-readable config summary for `check`; secrets are masked.
pub fn describe_config(config: &RelayConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "bot token:        {}", mask_token(config.bot_token()));
    let _ = writeln!(out, "operator:         {}", config.operator_id());
    let _ = writeln!(out, "log file:         {}", config.log_file());
    let _ = writeln!(
        out,
        "limits:           publish {} / intake {}",
        config.limits.publish_max_len, config.limits.intake_max_len
    );
    let _ = writeln!(
        out,
        "sessions:         ttl {}s, sweep {}s",
        config.session.ttl_secs, config.session.sweep_secs
    );
    let _ = writeln!(
        out,
        "llm:              {} @ {} (key {})",
        config.llm.llm_model,
        config.llm.openai_base_url,
        mask_token(&config.llm.openai_api_key)
    );
    let _ = writeln!(out, "personas:");
    for persona in config.personas.iter() {
        let credential = config
            .publisher
            .accounts
            .iter()
            .find(|a| a.persona_key == persona.key)
            .map(|a| mask_token(&a.credentials.access_token))
            .unwrap_or_else(|| "MISSING".to_string());
        let _ = writeln!(
            out,
            "  - {} ({}) x token {} mirror {}",
            persona.name,
            persona.key,
            credential,
            persona.mirror_channel.as_deref().unwrap_or("-")
        );
    }
    out
}
