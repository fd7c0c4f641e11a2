//! # session-store
//!
//! Ephemeral per-request workflow state. A [`Session`] is created when the operator sends text,
//! moves through the [`Stage`]s as they pick a persona, a variant and confirm, and disappears at the
//! first of: TTL elapsed since creation, cancel, or successful publish.
//!
//! Expiry is checked lazily on every access; [`SessionStore::spawn_sweeper`] additionally evicts
//! expired entries in the background. Time comes from an injected [`Clock`].

mod clock;
mod session;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use session::{Session, SessionError, SessionId, Stage};
pub use store::{SessionStore, DEFAULT_TTL};
