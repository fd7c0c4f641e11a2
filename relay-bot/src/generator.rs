//! Variant generator: turns the operator's text plus a persona style into candidate posts.

use anyhow::Result;
use async_trait::async_trait;
use llm_client::{ChatMessage, LlmClient};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Number of candidates requested from the model and the most that are kept.
pub const VARIANT_COUNT: usize = 3;

/// Produces candidate texts for a persona. Errors propagate as generation failures.
#[async_trait]
pub trait VariantGenerator: Send + Sync {
    async fn generate(&self, text: &str, style: &str) -> Result<Vec<String>>;
}

/// [`VariantGenerator`] backed by a chat-completion [`LlmClient`].
pub struct LlmVariantGenerator {
    llm_client: Arc<dyn LlmClient>,
    publish_max_len: usize,
}

impl LlmVariantGenerator {
    pub fn new(llm_client: Arc<dyn LlmClient>, publish_max_len: usize) -> Self {
        Self {
            llm_client,
            publish_max_len,
        }
    }

    fn user_prompt(&self, text: &str) -> String {
        format!(
            "Original Text:\n{text}\n\nNotes:\n- Respect X's {limit}-character limit.\n- Provide exactly {count} different translation variants, each on a new line.\n- Format: \"1. [first variant]\n2. [second variant]\n3. [third variant]\"",
            text = text,
            limit = self.publish_max_len,
            count = VARIANT_COUNT,
        )
    }
}

#[async_trait]
impl VariantGenerator for LlmVariantGenerator {
    #[instrument(skip(self, text, style), fields(text_len = text.chars().count()))]
    async fn generate(&self, text: &str, style: &str) -> Result<Vec<String>> {
        let messages = vec![ChatMessage::system(style), ChatMessage::user(self.user_prompt(text))];
        let raw = self.llm_client.get_llm_response_with_messages(messages).await?;
        let variants = parse_variants(&raw);
        debug!(count = variants.len(), "Parsed variants");
        Ok(variants)
    }
}

/// Collects up to [`VARIANT_COUNT`] lines shaped like `N. text`. When nothing matches, the whole
/// trimmed reply becomes the single candidate; an empty reply yields no candidates.
pub fn parse_variants(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let variants: Vec<String> = raw
        .lines()
        .filter_map(numbered_item)
        .take(VARIANT_COUNT)
        .map(str::to_string)
        .collect();

    if variants.is_empty() && !raw.is_empty() {
        warn!("No numbered variants in model reply, using raw text");
        return vec![raw.to_string()];
    }
    variants
}

/// `"12. text"` → `Some("text")`; requires at least one digit, a dot and non-empty text.
fn numbered_item(line: &str) -> Option<&str> {
    let line = line.trim();
    let digits = line.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix('.')?.trim();
    (!rest.is_empty()).then_some(rest)
}
