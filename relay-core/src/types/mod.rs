//! Core types: user, chat, inbound event, outbound reply, handler response, Handler and Middleware traits.
//!
//! One file per main type.

mod chat;
mod event;
mod handler;
mod reply;
mod response;
mod user;

pub use chat::Chat;
pub use event::{Event, EventKind};
pub use handler::{Handler, Middleware, ToCoreEvent, ToCoreUser};
pub use reply::{Action, Reply, TextFormat};
pub use response::HandlerResponse;
pub use user::User;
