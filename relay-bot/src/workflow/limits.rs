//! Length limits. Lengths are counted in Unicode scalar values, not bytes.

use anyhow::Result;

/// Publish and intake length limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowLimits {
    /// Longest variant that may be offered and published (X: 280).
    pub publish_max_len: usize,
    /// Longest accepted intake text.
    pub intake_max_len: usize,
}

impl Default for WorkflowLimits {
    fn default() -> Self {
        Self {
            publish_max_len: 280,
            intake_max_len: 10_000,
        }
    }
}

impl WorkflowLimits {
    pub fn validate(&self) -> Result<()> {
        if self.publish_max_len == 0 {
            anyhow::bail!("PUBLISH_MAX_LEN must be positive");
        }
        if self.intake_max_len == 0 {
            anyhow::bail!("INTAKE_MAX_LEN must be positive");
        }
        Ok(())
    }
}

pub fn text_len(text: &str) -> usize {
    text.chars().count()
}

/// Keeps the variants no longer than `limit`, in order. Idempotent.
pub fn filter_within_limit(variants: Vec<String>, limit: usize) -> Vec<String> {
    variants
        .into_iter()
        .filter(|v| text_len(v) <= limit)
        .collect()
}
