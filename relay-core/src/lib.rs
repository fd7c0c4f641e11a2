//! # relay-core
//!
//! Core types and traits for persona-relay: [`Bot`] (outbound responder), [`Handler`] and
//! [`Middleware`], inbound [`Event`]s, outbound [`Reply`]s, and tracing initialization.
//! Transport-agnostic; the Telegram layer in relay-bot converts to and from these types.

pub mod bot;
pub mod error;
pub mod logger;
pub mod types;

pub use bot::Bot;
pub use error::{RelayError, Result};
pub use logger::init_tracing;
pub use types::{
    Action, Chat, Event, EventKind, Handler, HandlerResponse, Middleware, Reply, TextFormat,
    ToCoreEvent, ToCoreUser, User,
};
