//! Component factory: builds RelayComponents from config. Isolates assembly logic from runner.

use anyhow::Result;
use handler_chain::HandlerChain;
use llm_client::{LlmClient, OpenAILlmClient};
use middleware::{AccessGuard, LoggingMiddleware};
use publisher::{Publisher, XPublisher};
use relay_core::{Bot as CoreBot, Handler};
use session_store::{SessionStore, SystemClock};
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info, instrument};

use crate::config::{Personas, RelayConfig};
use crate::generator::{LlmVariantGenerator, VariantGenerator};
use crate::telegram::TelegramBotAdapter;
use crate::workflow::RelayWorkflow;

/// Core dependencies for run_bot; produced by the component factory.
#[derive(Clone)]
pub struct RelayComponents {
    pub teloxide_bot: Bot,
    pub bot_adapter: Arc<dyn CoreBot>,
    pub store: Arc<SessionStore>,
    pub personas: Arc<Personas>,
    pub generator: Arc<dyn VariantGenerator>,
    pub publisher: Arc<dyn Publisher>,
}

/// Builds RelayComponents: teloxide bot (custom API URL if set), empty session store on the
/// system clock, LLM-backed generator and X publisher.
#[instrument(skip(config))]
pub fn build_components(config: &RelayConfig) -> Result<RelayComponents> {
    let teloxide_bot = {
        let bot = Bot::new(config.bot_token());
        if let Some(url_str) = config.telegram_api_url() {
            match reqwest::Url::parse(url_str) {
                Ok(url) => bot.set_api_url(url),
                Err(e) => {
                    error!(error = %e, url = %url_str, "Invalid TELEGRAM_API_URL, using default");
                    bot
                }
            }
        } else {
            bot
        }
    };
    let bot_adapter: Arc<dyn CoreBot> = Arc::new(TelegramBotAdapter::new(teloxide_bot.clone()));

    let store = Arc::new(SessionStore::new(
        Arc::new(SystemClock),
        config.session.ttl(),
    ));

    let llm_client: Arc<dyn LlmClient> = Arc::new(OpenAILlmClient::from_config(&config.llm));
    let generator: Arc<dyn VariantGenerator> = Arc::new(LlmVariantGenerator::new(
        llm_client,
        config.limits.publish_max_len,
    ));

    let publisher: Arc<dyn Publisher> = Arc::new(XPublisher::with_api_base(
        config.publisher.accounts.clone(),
        config.publisher.api_base.clone(),
    ));

    info!(
        personas = config.personas.len(),
        x_accounts = config.publisher.accounts.len(),
        ttl_secs = config.session.ttl_secs,
        "Components built"
    );

    Ok(RelayComponents {
        teloxide_bot,
        bot_adapter,
        store,
        personas: Arc::new(config.personas.clone()),
        generator,
        publisher,
    })
}

/// Builds the workflow handler over the given components.
pub fn build_workflow(config: &RelayConfig, components: &RelayComponents) -> Arc<RelayWorkflow> {
    Arc::new(RelayWorkflow::new(
        components.store.clone(),
        components.personas.clone(),
        components.generator.clone(),
        components.publisher.clone(),
        components.bot_adapter.clone(),
        config.limits,
    ))
}

/// Builds the handler chain (logging → access guard → workflow).
pub fn build_handler_chain(operator_id: i64, workflow: Arc<dyn Handler>) -> HandlerChain {
    HandlerChain::new()
        .add_middleware(Arc::new(LoggingMiddleware))
        .add_middleware(Arc::new(AccessGuard::new(operator_id)))
        .add_handler(workflow)
}
