//! Message presenter: pure functions from workflow state to outbound [`Reply`] values.
//!
//! Rich replies use Telegram HTML; every piece of operator or model text is escaped first.

use callback_token::{CallbackToken, MAX_TOKEN_BYTES};
use relay_core::{Action, Reply};
use teloxide::utils::html;

use crate::config::{Persona, Personas};
use crate::workflow::{text_len, WorkflowError};

/// Source preview length in the persona menu.
pub const SOURCE_PREVIEW_CHARS: usize = 100;
/// Variant preview length on menu buttons.
pub const VARIANT_PREVIEW_CHARS: usize = 30;

const ELLIPSIS: &str = "...";
const CANCEL_LABEL: &str = "❌ Cancel";

/// Outcome of copying a published post to the persona's mirror channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorStatus {
    Sent,
    Failed,
}

/// First `max` chars of `text`, with `...` appended only when something was cut.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ELLIPSIS),
        None => text.to_string(),
    }
}

/// First action token longer than a Telegram callback payload allows.
pub fn oversized_token(reply: &Reply) -> Option<&str> {
    reply
        .actions
        .iter()
        .map(|action| action.token.as_str())
        .find(|token| token.len() > MAX_TOKEN_BYTES)
}

fn cancel_action(session_id: &str) -> Action {
    let token = CallbackToken::Cancel {
        session_id: session_id.to_string(),
    };
    Action::new(CANCEL_LABEL, token.encode())
}

pub fn welcome() -> Reply {
    Reply::plain(
        "Hello! 👋\n\nSend me text in your native language, and I will translate it tailored to your Twitter persona.",
    )
}

/// Source preview plus one button per configured persona, in order, then Cancel.
pub fn persona_menu(session_id: &str, original_text: &str, personas: &Personas) -> Reply {
    let text = format!(
        "📝 <b>Select Account/Style:</b>\n\n\"{}\"",
        html::escape(&truncate(original_text, SOURCE_PREVIEW_CHARS))
    );
    let actions = personas.iter().enumerate().map(|(i, persona)| {
        let token = CallbackToken::SelectPersona {
            session_id: session_id.to_string(),
            persona: i,
        };
        Action::new(format!("📱 {}", persona.name), token.encode())
    });
    Reply::html(text)
        .with_actions(actions)
        .with_action(cancel_action(session_id))
}

pub fn generating(persona: &Persona) -> Reply {
    Reply::plain(format!("🔄 Generating options for {}...", persona.name))
}

/// Every variant in full with its length against the limit; buttons carry 30-char previews.
pub fn variant_menu(session_id: &str, persona: &Persona, variants: &[String], limit: usize) -> Reply {
    let mut text = format!("📝 Choose version for {}:\n\n", persona.name);
    for (i, variant) in variants.iter().enumerate() {
        text.push_str(&format!(
            "{}. {}\n📊 {}/{}\n\n",
            i + 1,
            variant,
            text_len(variant),
            limit
        ));
    }
    let actions = variants.iter().enumerate().map(|(i, variant)| {
        let token = CallbackToken::SelectVariant {
            session_id: session_id.to_string(),
            index: i,
        };
        Action::new(
            format!("{}. {}", i + 1, truncate(variant, VARIANT_PREVIEW_CHARS)),
            token.encode(),
        )
    });
    Reply::plain(text.trim_end())
        .with_actions(actions)
        .with_action(cancel_action(session_id))
}

/// Chosen text (1-based option number) with Publish and Cancel.
pub fn confirm(session_id: &str, persona: &Persona, index: usize, final_text: &str) -> Reply {
    let token = CallbackToken::Publish {
        session_id: session_id.to_string(),
    };
    Reply::plain(format!("✅ Selected Option {}:\n\n{}", index + 1, final_text))
        .with_action(Action::new(format!("✅ Post to {}", persona.name), token.encode()))
        .with_action(cancel_action(session_id))
}

pub fn publishing() -> Reply {
    Reply::plain("📤 Posting...")
}

/// Confirmation with the post link; the channel line appears only when a mirror was attempted.
pub fn published(url: &str, mirror: Option<MirrorStatus>) -> Reply {
    let mut text = format!(
        "✅ <b>Posted!</b>\n\n🔗 <a href=\"{}\">Link to Tweet</a>",
        html::escape(url)
    );
    match mirror {
        Some(MirrorStatus::Sent) => text.push_str("\n📢 Channel: Sent"),
        Some(MirrorStatus::Failed) => text.push_str("\n📢 Channel: Failed"),
        None => {}
    }
    Reply::html(text)
}

/// Plain-text copy sent to a persona's mirror channel.
pub fn mirror_post(final_text: &str, url: &str) -> String {
    format!("New Tweet:\n\n{}\n\n{}", final_text, url)
}

pub fn cancelled() -> Reply {
    Reply::plain("❌ Cancelled")
}

pub fn error(err: &WorkflowError) -> Reply {
    Reply::plain(err.to_string())
}
