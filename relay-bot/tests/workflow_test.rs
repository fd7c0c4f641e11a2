//! End-to-end workflow scenarios through the handler chain (logging → access guard → workflow),
//! with mock responder, generator and publisher and a manual clock.

mod common;

use callback_token::CallbackToken;
use chrono::Duration;
use common::*;
use relay_core::{HandlerResponse, TextFormat};
use session_store::Stage;

const SESSION_EXPIRED: &str = "Session expired or not found. Please try again.";
const URL: &str = "https://x.com/i/web/status/1850000000000000001";

fn three_short() -> MockGenerator {
    MockGenerator::with_results(vec![variants(&[
        "variant one",
        "variant two",
        "variant three",
    ])])
}

/// Drives intake and persona pick; returns the session id.
async fn to_variant_menu(h: &Harness, persona_label: &str) -> String {
    h.send_text("Hello world").await;
    let token = h.token_for(persona_label);
    h.click(&token).await;
    CallbackToken::decode(&token).unwrap().session_id().to_string()
}

/// **Test: Events from anyone but the operator change nothing and get no reply.**
#[tokio::test]
async fn test_unauthorized_events_are_dropped() {
    let h = Harness::new(MockBot::default(), three_short(), MockPublisher::default());

    let response = h.chain.handle(&h.text_event(999, "Hello world")).await.unwrap();
    assert_eq!(response, HandlerResponse::Stop);
    assert!(h.store.is_empty().await);

    let cancel = CallbackToken::Cancel {
        session_id: "4242_0_0".to_string(),
    };
    h.chain
        .handle(&h.action_event(999, &cancel.encode()))
        .await
        .unwrap();

    assert_eq!(h.bot.reply_count(), 0);
}

/// **Test: Another user replays the operator's live Cancel and Publish tokens.**
///
/// **Expected:** the session survives with its stage and final text unchanged, nothing is
/// published, and no reply is sent.
#[tokio::test]
async fn test_unauthorized_actions_leave_live_session_untouched() {
    let h = Harness::new(
        MockBot::default(),
        three_short(),
        MockPublisher::with_results(vec![Ok(URL.to_string())]),
    );

    let session_id = to_variant_menu(&h, "📱 Persona A").await;
    h.click(&h.token_at(0)).await;
    let publish_token = h.token_for("✅ Post to Persona A");
    let cancel_token = h.token_for("❌ Cancel");
    let replies_before = h.bot.reply_count();

    for token in [&cancel_token, &publish_token] {
        let response = h.chain.handle(&h.action_event(999, token)).await.unwrap();
        assert_eq!(response, HandlerResponse::Stop);
    }

    let session = h.store.get(&session_id).await.unwrap();
    assert_eq!(session.stage(), Stage::AwaitingConfirm);
    assert_eq!(session.final_text(), Some("variant one"));
    assert_eq!(h.bot.reply_count(), replies_before);
    assert_eq!(h.publisher.call_count(), 0);
}

#[tokio::test]
async fn test_start_sends_welcome_without_session() {
    let h = Harness::new(MockBot::default(), three_short(), MockPublisher::default());

    h.send_text("/start").await;

    assert!(h.bot.last_reply().text.starts_with("Hello! 👋"));
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_other_commands_and_blank_text_are_ignored() {
    let h = Harness::new(MockBot::default(), three_short(), MockPublisher::default());

    assert_eq!(h.send_text("/help").await, HandlerResponse::Continue);
    assert_eq!(h.send_text("   \n").await, HandlerResponse::Continue);

    assert_eq!(h.bot.reply_count(), 0);
    assert!(h.store.is_empty().await);
}

/// **Test: Text with leading whitespace before '/' is intake, not a command.**
#[tokio::test]
async fn test_leading_space_slash_is_intake() {
    let h = Harness::new(MockBot::default(), three_short(), MockPublisher::default());

    h.send_text(" /not a command").await;

    assert_eq!(h.store.len().await, 1);
    assert_eq!(
        h.bot.last_reply().action_labels(),
        vec!["📱 Persona A", "📱 Persona B", "❌ Cancel"]
    );
}

/// **Test: Intake over 10,000 chars is rejected with no session; exactly 10,000 is accepted.**
#[tokio::test]
async fn test_intake_length_limit() {
    let h = Harness::new(MockBot::default(), three_short(), MockPublisher::default());

    h.send_text(&"a".repeat(10_001)).await;
    assert_eq!(
        h.bot.last_reply().text,
        "Message too long. Maximum 10,000 characters allowed."
    );
    assert!(h.store.is_empty().await);

    h.send_text(&"a".repeat(10_000)).await;
    assert_eq!(h.store.len().await, 1);
    assert_eq!(
        h.bot.last_reply().action_labels(),
        vec!["📱 Persona A", "📱 Persona B", "❌ Cancel"]
    );
    assert_eq!(h.bot.last_reply().format, TextFormat::Html);
}

/// **Test: Full happy path from intake to publish.**
///
/// **Expected:** all three variants offered, option 2 confirmed with its exact text, publish
/// receives persona key and text, session deleted, confirmation links the URL.
#[tokio::test]
async fn test_happy_path_publishes_selected_variant() {
    let h = Harness::new(
        MockBot::default(),
        three_short(),
        MockPublisher::with_results(vec![Ok(URL.to_string())]),
    );

    let session_id = to_variant_menu(&h, "📱 Persona A").await;
    assert_eq!(
        h.generator.calls.lock().unwrap()[0],
        ("Hello world".to_string(), "style A".to_string())
    );

    let replies = h.bot.replies();
    assert_eq!(replies[1].text, "🔄 Generating options for Persona A...");
    let menu = h.bot.last_reply();
    assert!(menu.text.contains("2. variant two\n📊 11/280"));
    assert_eq!(
        menu.action_labels(),
        vec!["1. variant one", "2. variant two", "3. variant three", "❌ Cancel"]
    );
    let session = h.store.get(&session_id).await.unwrap();
    assert_eq!(session.stage(), Stage::AwaitingVariant);
    assert_eq!(session.persona_key(), Some("account1"));

    h.click(&h.token_at(1)).await;
    let confirm = h.bot.last_reply();
    assert_eq!(confirm.text, "✅ Selected Option 2:\n\nvariant two");
    assert_eq!(confirm.action_labels(), vec!["✅ Post to Persona A", "❌ Cancel"]);

    h.click(&h.token_for("✅ Post to Persona A")).await;

    assert_eq!(
        h.publisher.calls.lock().unwrap().clone(),
        vec![("account1".to_string(), "variant two".to_string())]
    );
    let replies = h.bot.replies();
    assert_eq!(replies[replies.len() - 2].text, "📤 Posting...");
    let done = h.bot.last_reply();
    assert!(done.text.contains("Posted!"));
    assert!(done.text.contains(URL));
    assert!(!done.text.contains("Channel"));
    assert!(h.store.get(&session_id).await.is_none());
    assert!(h.bot.channel_posts().is_empty());
}

/// **Test: All candidates over 280 chars.**
///
/// **Expected:** AllVariantsTooLong; session kept, back at AwaitingPersona, no variants stored.
#[tokio::test]
async fn test_all_variants_too_long_keeps_session() {
    let long = "x".repeat(281);
    let h = Harness::new(
        MockBot::default(),
        MockGenerator::with_results(vec![variants(&[long.as_str(), long.as_str(), long.as_str()])]),
        MockPublisher::default(),
    );

    let session_id = to_variant_menu(&h, "📱 Persona A").await;

    assert_eq!(
        h.bot.last_reply().text,
        "All generated variants exceeded the character limit. Please shorten your original text."
    );
    let session = h.store.get(&session_id).await.unwrap();
    assert_eq!(session.stage(), Stage::AwaitingPersona);
    assert_eq!(session.persona_key(), Some("account1"));
    assert!(session.variants().is_none());
}

/// **Test: Only candidates within the limit are offered, in order.**
#[tokio::test]
async fn test_over_limit_variants_are_filtered() {
    let long = "y".repeat(300);
    let h = Harness::new(
        MockBot::default(),
        MockGenerator::with_results(vec![variants(&["keep me", long.as_str(), "me too"])]),
        MockPublisher::default(),
    );

    let session_id = to_variant_menu(&h, "📱 Persona A").await;

    let session = h.store.get(&session_id).await.unwrap();
    assert_eq!(session.variants().unwrap(), ["keep me", "me too"]);
    assert_eq!(
        h.bot.last_reply().action_labels(),
        vec!["1. keep me", "2. me too", "❌ Cancel"]
    );
}

/// **Test: Generator error shows the generic message and keeps the session for another try.**
#[tokio::test]
async fn test_generation_failure_allows_retry() {
    let h = Harness::new(
        MockBot::default(),
        MockGenerator::with_results(vec![
            Err(anyhow::anyhow!("upstream 500")),
            variants(&["second time lucky"]),
        ]),
        MockPublisher::default(),
    );

    h.send_text("Hello world").await;
    let persona_token = h.token_for("📱 Persona B");
    h.click(&persona_token).await;

    assert_eq!(
        h.bot.last_reply().text,
        "An error occurred. Please try again later."
    );
    let session_id = CallbackToken::decode(&persona_token).unwrap().session_id().to_string();
    assert_eq!(
        h.store.get(&session_id).await.unwrap().stage(),
        Stage::AwaitingPersona
    );

    h.click(&persona_token).await;
    assert_eq!(
        h.bot.last_reply().action_labels(),
        vec!["1. second time lucky", "❌ Cancel"]
    );
    assert_eq!(h.generator.call_count(), 2);
}

/// **Test: Publish fails with "network timeout", then the same token succeeds.**
///
/// **Expected:** reason shown, final text kept, second publish uses the same text without
/// re-selecting.
#[tokio::test]
async fn test_publish_failure_then_retry_succeeds() {
    let h = Harness::new(
        MockBot::default(),
        three_short(),
        MockPublisher::with_results(vec![
            Err("network timeout".to_string()),
            Ok(URL.to_string()),
        ]),
    );

    let session_id = to_variant_menu(&h, "📱 Persona A").await;
    h.click(&h.token_at(0)).await;
    let publish_token = h.token_for("✅ Post to Persona A");

    h.click(&publish_token).await;
    let failure = h.bot.last_reply();
    assert!(failure.text.starts_with("Failed to post tweet."));
    assert!(failure.text.contains("network timeout"));
    let session = h.store.get(&session_id).await.unwrap();
    assert_eq!(session.final_text(), Some("variant one"));
    assert_eq!(session.stage(), Stage::AwaitingConfirm);

    h.click(&publish_token).await;
    assert!(h.bot.last_reply().text.contains(URL));
    assert!(h.store.get(&session_id).await.is_none());
    let calls = h.publisher.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1]);
}

/// **Test: Cancel for an id that never existed still answers "Cancelled".**
#[tokio::test]
async fn test_cancel_unknown_session_is_acknowledged() {
    let h = Harness::new(MockBot::default(), three_short(), MockPublisher::default());

    let token = CallbackToken::Cancel {
        session_id: "4242_1_99".to_string(),
    };
    h.click(&token.encode()).await;

    assert_eq!(h.bot.last_reply().text, "❌ Cancelled");
}

#[tokio::test]
async fn test_cancel_removes_session() {
    let h = Harness::new(MockBot::default(), three_short(), MockPublisher::default());

    h.send_text("Hello world").await;
    let persona_token = h.token_for("📱 Persona A");
    h.click(&h.token_for("❌ Cancel")).await;

    assert_eq!(h.bot.last_reply().text, "❌ Cancelled");
    assert!(h.store.is_empty().await);

    h.click(&persona_token).await;
    assert_eq!(h.bot.last_reply().text, SESSION_EXPIRED);
    assert_eq!(h.generator.call_count(), 0);
}

/// **Test: A session is usable just before the TTL and gone exactly at it.**
#[tokio::test]
async fn test_session_expires_at_ttl() {
    let h = Harness::new(
        MockBot::default(),
        MockGenerator::with_results(vec![variants(&["fresh"])]),
        MockPublisher::default(),
    );

    h.send_text("first").await;
    let early = h.token_for("📱 Persona A");
    h.clock.advance(Duration::milliseconds(119_999));
    h.click(&early).await;
    assert_eq!(
        h.bot.last_reply().action_labels(),
        vec!["1. fresh", "❌ Cancel"]
    );

    h.send_text("second").await;
    let late = h.token_for("📱 Persona A");
    h.clock.advance(Duration::seconds(120));
    h.click(&late).await;
    assert_eq!(h.bot.last_reply().text, SESSION_EXPIRED);
    assert_eq!(h.generator.call_count(), 1);
}

/// **Test: Expiry applies at every stage, including after the confirmation was shown.**
#[tokio::test]
async fn test_publish_after_expiry_reports_expired() {
    let h = Harness::new(
        MockBot::default(),
        three_short(),
        MockPublisher::with_results(vec![Ok(URL.to_string())]),
    );

    to_variant_menu(&h, "📱 Persona A").await;
    h.click(&h.token_at(2)).await;
    let publish_token = h.token_for("✅ Post to Persona A");

    h.clock.advance(Duration::minutes(2));
    h.click(&publish_token).await;

    assert_eq!(h.bot.last_reply().text, SESSION_EXPIRED);
    assert_eq!(h.publisher.call_count(), 0);
}

#[tokio::test]
async fn test_actions_on_unknown_session_report_expired() {
    let h = Harness::new(MockBot::default(), three_short(), MockPublisher::default());

    let tokens = [
        CallbackToken::SelectPersona {
            session_id: "nope".to_string(),
            persona: 0,
        },
        CallbackToken::SelectVariant {
            session_id: "nope".to_string(),
            index: 0,
        },
        CallbackToken::Publish {
            session_id: "nope".to_string(),
        },
    ];
    for token in tokens {
        h.click(&token.encode()).await;
        assert_eq!(h.bot.last_reply().text, SESSION_EXPIRED);
    }
    assert_eq!(h.bot.reply_count(), 3);
}

#[tokio::test]
async fn test_stale_persona_index_reports_expired() {
    let h = Harness::new(MockBot::default(), three_short(), MockPublisher::default());

    h.send_text("Hello world").await;
    let session_id = CallbackToken::decode(&h.token_at(0))
        .unwrap()
        .session_id()
        .to_string();
    let stale = CallbackToken::SelectPersona {
        session_id,
        persona: 5,
    };
    h.click(&stale.encode()).await;

    assert_eq!(h.bot.last_reply().text, SESSION_EXPIRED);
    assert_eq!(h.generator.call_count(), 0);
}

#[tokio::test]
async fn test_variant_index_out_of_range() {
    let h = Harness::new(MockBot::default(), three_short(), MockPublisher::default());

    let session_id = to_variant_menu(&h, "📱 Persona A").await;
    let token = CallbackToken::SelectVariant {
        session_id: session_id.clone(),
        index: 7,
    };
    h.click(&token.encode()).await;

    assert_eq!(h.bot.last_reply().text, "Selected variant not found.");
    assert_eq!(
        h.store.get(&session_id).await.unwrap().stage(),
        Stage::AwaitingVariant
    );
}

#[tokio::test]
async fn test_variant_before_generation_reports_expired() {
    let h = Harness::new(MockBot::default(), three_short(), MockPublisher::default());

    h.send_text("Hello world").await;
    let session_id = CallbackToken::decode(&h.token_at(0))
        .unwrap()
        .session_id()
        .to_string();
    let token = CallbackToken::SelectVariant {
        session_id,
        index: 0,
    };
    h.click(&token.encode()).await;

    assert_eq!(h.bot.last_reply().text, SESSION_EXPIRED);
}

/// **Test: Picking another variant after confirming keeps the first choice.**
#[tokio::test]
async fn test_final_text_is_not_replaced() {
    let h = Harness::new(
        MockBot::default(),
        three_short(),
        MockPublisher::with_results(vec![Ok(URL.to_string())]),
    );

    let session_id = to_variant_menu(&h, "📱 Persona A").await;
    let menu = h.bot.last_reply();
    h.click(&menu.actions[0].token).await;
    h.click(&menu.actions[2].token).await;

    assert_eq!(h.bot.last_reply().text, "✅ Selected Option 1:\n\nvariant one");
    assert_eq!(
        h.store.get(&session_id).await.unwrap().final_text(),
        Some("variant one")
    );
}

/// **Test: Persona clicked again after generation re-shows the menu without regenerating.**
#[tokio::test]
async fn test_repeat_persona_click_reuses_variants() {
    let h = Harness::new(MockBot::default(), three_short(), MockPublisher::default());

    h.send_text("Hello world").await;
    let persona_token = h.token_for("📱 Persona A");
    h.click(&persona_token).await;
    let first_menu = h.bot.last_reply();
    h.click(&persona_token).await;

    assert_eq!(h.bot.last_reply(), first_menu);
    assert_eq!(h.generator.call_count(), 1);
}

/// **Test: Mirror channel gets a copy and the confirmation says "Channel: Sent".**
#[tokio::test]
async fn test_publish_with_mirror_channel() {
    let h = Harness::new(
        MockBot::default(),
        three_short(),
        MockPublisher::with_results(vec![Ok(URL.to_string())]),
    );

    to_variant_menu(&h, "📱 Persona B").await;
    h.click(&h.token_at(0)).await;
    h.click(&h.token_for("✅ Post to Persona B")).await;

    assert_eq!(
        h.bot.channel_posts(),
        vec![(
            "@persona_b".to_string(),
            format!("New Tweet:\n\nvariant one\n\n{}", URL)
        )]
    );
    assert!(h.bot.last_reply().text.ends_with("📢 Channel: Sent"));
}

/// **Test: Mirror failure is reported inline; the publish still counts and the session is gone.**
#[tokio::test]
async fn test_mirror_failure_is_non_fatal() {
    let h = Harness::new(
        MockBot::failing_channel(),
        three_short(),
        MockPublisher::with_results(vec![Ok(URL.to_string())]),
    );

    let session_id = to_variant_menu(&h, "📱 Persona B").await;
    h.click(&h.token_at(0)).await;
    h.click(&h.token_for("✅ Post to Persona B")).await;

    let done = h.bot.last_reply();
    assert!(done.text.contains(URL));
    assert!(done.text.ends_with("📢 Channel: Failed"));
    assert!(h.store.get(&session_id).await.is_none());
    assert_eq!(h.publisher.call_count(), 1);
}

/// **Test: A second publish click while the first is in flight.**
///
/// **Expected:** the second gets ActionInProgress and the publisher runs once.
#[tokio::test]
async fn test_duplicate_publish_while_in_flight() {
    let h = Harness::new(
        MockBot::default(),
        three_short(),
        MockPublisher::gated(vec![Ok(URL.to_string())]),
    );

    let session_id = to_variant_menu(&h, "📱 Persona A").await;
    h.click(&h.token_at(0)).await;
    let publish_token = h.token_for("✅ Post to Persona A");

    let chain = h.chain.clone();
    let first = h.action_event(OPERATOR_ID, &publish_token);
    let in_flight = tokio::spawn(async move { chain.handle(&first).await.unwrap() });

    h.publisher.entered.notified().await;
    assert_eq!(
        h.store.get(&session_id).await.unwrap().stage(),
        Stage::Publishing
    );
    h.click(&publish_token).await;
    assert_eq!(h.bot.last_reply().text, "⏳ Still working on it, please wait.");

    h.publisher.release.notify_one();
    in_flight.await.unwrap();

    assert_eq!(h.publisher.call_count(), 1);
    assert!(h.bot.last_reply().text.contains(URL));
    assert!(h.store.get(&session_id).await.is_none());
}

#[tokio::test]
async fn test_unknown_and_malformed_tokens_are_ignored() {
    let h = Harness::new(MockBot::default(), three_short(), MockPublisher::default());

    for raw in ["zzz:abc", "translate_account1_4242_1", "p:abc", "v:1:bad\\escape"] {
        assert_eq!(h.click(raw).await, HandlerResponse::Continue);
    }
    assert_eq!(h.bot.reply_count(), 0);
}
