//! # middleware
//!
//! Chain middleware for persona-relay: [`LoggingMiddleware`] logs every event and its outcome,
//! [`AccessGuard`] lets only the configured operator through.

mod access_guard;
mod logging;

#[cfg(test)]
mod test;

pub use access_guard::AccessGuard;
pub use logging::LoggingMiddleware;
