//! Relay configuration: BaseConfig (Telegram + log + operator) + personas, limits, session, publisher and LLM settings.

mod base;
mod persona;
mod relay_config;


pub use base::BaseConfig;
pub use persona::{Persona, Personas, DEFAULT_STYLE};
pub use relay_config::{PublisherConfig, RelayConfig, SessionConfig};
