//! Test doubles and a harness that wires the workflow like production, minus Telegram and HTTP.

#![allow(dead_code)]

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use handler_chain::HandlerChain;
use publisher::{PublishError, Publisher};
use relay_bot::{
    build_handler_chain, Persona, Personas, RelayWorkflow, VariantGenerator, WorkflowLimits,
};
use relay_core::{Bot, Chat, Event, HandlerResponse, RelayError, Reply, Result, User};
use session_store::{ManualClock, SessionStore, DEFAULT_TTL};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const OPERATOR_ID: i64 = 42;
pub const CHAT_ID: i64 = 4242;

/// Records everything the workflow sends.
#[derive(Default)]
pub struct MockBot {
    pub replies: Mutex<Vec<Reply>>,
    pub channel_posts: Mutex<Vec<(String, String)>>,
    pub fail_channel: bool,
}

impl MockBot {
    pub fn failing_channel() -> Self {
        Self {
            fail_channel: true,
            ..Self::default()
        }
    }

    pub fn replies(&self) -> Vec<Reply> {
        self.replies.lock().unwrap().clone()
    }

    pub fn last_reply(&self) -> Reply {
        self.replies
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no reply sent")
    }

    pub fn reply_count(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    pub fn channel_posts(&self) -> Vec<(String, String)> {
        self.channel_posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn send_reply(&self, _chat: &Chat, reply: &Reply) -> Result<()> {
        self.replies.lock().unwrap().push(reply.clone());
        Ok(())
    }

    async fn send_to_channel(&self, channel: &str, text: &str) -> Result<()> {
        if self.fail_channel {
            return Err(RelayError::Bot("chat not found".to_string()));
        }
        self.channel_posts
            .lock()
            .unwrap()
            .push((channel.to_string(), text.to_string()));
        Ok(())
    }
}

/// Returns queued results in order; records (text, style) per call.
#[derive(Default)]
pub struct MockGenerator {
    results: Mutex<VecDeque<AnyResult<Vec<String>>>>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl MockGenerator {
    pub fn with_results(results: Vec<AnyResult<Vec<String>>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl VariantGenerator for MockGenerator {
    async fn generate(&self, text: &str, style: &str) -> AnyResult<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), style.to_string()));
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted result")))
    }
}

/// Returns queued results in order. When `gated`, each call signals `entered` and then waits for
/// `release` before answering.
#[derive(Default)]
pub struct MockPublisher {
    results: Mutex<VecDeque<std::result::Result<String, String>>>,
    pub calls: Mutex<Vec<(String, String)>>,
    pub gated: bool,
    pub entered: Notify,
    pub release: Notify,
}

impl MockPublisher {
    pub fn with_results(results: Vec<std::result::Result<String, String>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            ..Self::default()
        }
    }

    pub fn gated(results: Vec<std::result::Result<String, String>>) -> Self {
        Self {
            gated: true,
            ..Self::with_results(results)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn publish(&self, persona_key: &str, text: &str) -> std::result::Result<String, PublishError> {
        self.calls
            .lock()
            .unwrap()
            .push((persona_key.to_string(), text.to_string()));
        if self.gated {
            self.entered.notify_one();
            self.release.notified().await;
        }
        let next = self.results.lock().unwrap().pop_front();
        match next {
            Some(Ok(url)) => Ok(url),
            Some(Err(reason)) => Err(PublishError::InvalidResponse(reason)),
            None => Err(PublishError::NotConfigured(persona_key.to_string())),
        }
    }
}

pub fn personas() -> Personas {
    Personas::new(vec![
        Persona::new("account1", "Persona A", "style A"),
        Persona::new("account2", "Persona B", "style B").with_mirror_channel("@persona_b"),
    ])
}

/// Workflow + chain over mocks, on a manual clock.
pub struct Harness {
    pub chain: HandlerChain,
    pub store: Arc<SessionStore>,
    pub clock: Arc<ManualClock>,
    pub bot: Arc<MockBot>,
    pub generator: Arc<MockGenerator>,
    pub publisher: Arc<MockPublisher>,
    next_event: Mutex<u64>,
}

impl Harness {
    pub fn new(bot: MockBot, generator: MockGenerator, publisher: MockPublisher) -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
        ));
        let store = Arc::new(SessionStore::new(clock.clone(), DEFAULT_TTL));
        let bot = Arc::new(bot);
        let generator = Arc::new(generator);
        let publisher = Arc::new(publisher);
        let workflow = Arc::new(RelayWorkflow::new(
            store.clone(),
            Arc::new(personas()),
            generator.clone(),
            publisher.clone(),
            bot.clone(),
            WorkflowLimits::default(),
        ));
        let chain = build_handler_chain(OPERATOR_ID, workflow);
        Self {
            chain,
            store,
            clock,
            bot,
            generator,
            publisher,
            next_event: Mutex::new(0),
        }
    }

    fn event_id(&self) -> String {
        let mut next = self.next_event.lock().unwrap();
        *next += 1;
        next.to_string()
    }

    pub fn text_event(&self, user_id: i64, text: &str) -> Event {
        Event::text(self.event_id(), User::anonymous(user_id), Chat::private(CHAT_ID), text)
    }

    pub fn action_event(&self, user_id: i64, token: &str) -> Event {
        Event::action(self.event_id(), User::anonymous(user_id), Chat::private(CHAT_ID), token)
    }

    pub async fn send_text(&self, text: &str) -> HandlerResponse {
        let event = self.text_event(OPERATOR_ID, text);
        self.chain.handle(&event).await.unwrap()
    }

    pub async fn click(&self, token: &str) -> HandlerResponse {
        let event = self.action_event(OPERATOR_ID, token);
        self.chain.handle(&event).await.unwrap()
    }

    /// Token of the button with `label` on the last reply.
    pub fn token_for(&self, label: &str) -> String {
        let reply = self.bot.last_reply();
        reply
            .actions
            .iter()
            .find(|a| a.label == label)
            .map(|a| a.token.clone())
            .unwrap_or_else(|| panic!("no '{}' button in {:?}", label, reply.action_labels()))
    }

    /// Token of the action at `index` on the last reply.
    pub fn token_at(&self, index: usize) -> String {
        self.bot.last_reply().actions[index].token.clone()
    }
}

pub fn variants(texts: &[&str]) -> AnyResult<Vec<String>> {
    Ok(texts.iter().map(|t| t.to_string()).collect())
}
