//! Intake → persona → generating → variant → confirm → publish/cancel state machine.

mod error;
mod handler;
mod limits;

pub use error::WorkflowError;
pub use handler::RelayWorkflow;
pub use limits::{filter_within_limit, text_len, WorkflowLimits};
