//! Process entry: validate config, init logging, build components, dispatch until shutdown.

use anyhow::Result;
use middleware::AccessGuard;
use relay_core::init_tracing;
use tracing::{info, instrument, warn};

use crate::components::{build_components, build_handler_chain, build_workflow};
use crate::config::RelayConfig;
use crate::telegram::run_dispatcher;

/// Main entry: validate config, init logging, build components and chain, then run the
/// dispatcher. On shutdown the sweeper is stopped and every session is dropped.
#[instrument(skip(config))]
pub async fn run_bot(config: RelayConfig) -> Result<()> {
    config.validate()?;
    init_tracing(config.log_file())?;

    for key in config.personas_without_credentials() {
        warn!(persona = %key, "No X access token configured; publishing will fail for this persona");
    }
    info!(
        operator_id = config.operator_id(),
        personas = config.personas.len(),
        publish_max_len = config.limits.publish_max_len,
        "Initializing relay"
    );

    let components = build_components(&config)?;
    let workflow = build_workflow(&config, &components);
    let handler_chain = build_handler_chain(config.operator_id(), workflow);
    let sweeper = config
        .session
        .sweep_interval()
        .map(|interval| components.store.spawn_sweeper(interval));

    info!("Bot started successfully");

    let result = run_dispatcher(
        components.teloxide_bot.clone(),
        handler_chain,
        AccessGuard::new(config.operator_id()),
    )
    .await;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    let dropped = components.store.len().await;
    components.store.clear().await;
    info!(dropped_sessions = dropped, "Bot stopped");

    result
}
