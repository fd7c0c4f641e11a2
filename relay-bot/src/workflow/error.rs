//! Workflow errors. `Display` is the text shown to the operator.

use thiserror::Error;

/// A transition that ended in a user-visible error reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Message too long. Maximum {} characters allowed.", thousands(.max))]
    InputTooLong { max: usize },

    /// Deleted, expired or never existed; the message is the same for all three.
    #[error("Session expired or not found. Please try again.")]
    SessionExpiredOrMissing,

    #[error("Selected variant not found.")]
    VariantNotFound,

    #[error("All generated variants exceeded the character limit. Please shorten your original text.")]
    AllVariantsTooLong,

    /// Cause is logged, never shown.
    #[error("An error occurred. Please try again later.")]
    GenerationFailure(String),

    #[error("Failed to post tweet. {0}")]
    PublishFailure(String),

    /// A generator or publisher call already owns the session.
    #[error("⏳ Still working on it, please wait.")]
    ActionInProgress,

    /// Cause is logged, never shown.
    #[error("An error occurred. Please try again later.")]
    Unexpected(String),
}

impl WorkflowError {
    /// Detail for the log line, if any.
    pub fn cause(&self) -> Option<&str> {
        match self {
            WorkflowError::GenerationFailure(cause)
            | WorkflowError::PublishFailure(cause)
            | WorkflowError::Unexpected(cause) => Some(cause),
            _ => None,
        }
    }
}

/// `10000` → `10,000`.
fn thousands(n: &usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            WorkflowError::InputTooLong { max: 10_000 }.to_string(),
            "Message too long. Maximum 10,000 characters allowed."
        );
        assert_eq!(
            WorkflowError::PublishFailure("network timeout".to_string()).to_string(),
            "Failed to post tweet. network timeout"
        );
        let generation = WorkflowError::GenerationFailure("401 invalid key".to_string());
        assert_eq!(generation.to_string(), "An error occurred. Please try again later.");
        assert_eq!(generation.cause(), Some("401 invalid key"));
        assert_eq!(WorkflowError::VariantNotFound.cause(), None);
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(&0), "0");
        assert_eq!(thousands(&280), "280");
        assert_eq!(thousands(&1000), "1,000");
        assert_eq!(thousands(&1234567), "1,234,567");
    }
}
