//! # Persona relay
//!
//! Telegram bot that takes text from a single operator, rewrites it per persona through an LLM,
//! lets the operator pick and confirm a variant, and publishes it to the persona's X account.
//! Wires relay-core, handler-chain, middleware, session-store, callback-token, llm-client and
//! publisher; loads config from env and runs the dispatcher.

pub mod cli;
pub mod components;
pub mod config;
pub mod generator;
pub mod presenter;
pub mod runner;
pub mod telegram;
pub mod workflow;

pub use cli::{describe_config, load_config, Cli, Commands};
pub use components::{build_components, build_handler_chain, build_workflow, RelayComponents};
pub use config::{Persona, Personas, RelayConfig};
pub use generator::{parse_variants, LlmVariantGenerator, VariantGenerator};
pub use runner::run_bot;
pub use telegram::{run_dispatcher, TelegramBotAdapter};
pub use workflow::{filter_within_limit, RelayWorkflow, WorkflowError, WorkflowLimits};
