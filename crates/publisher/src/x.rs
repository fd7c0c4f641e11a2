//! X (Twitter) API v2 publisher. Each persona posts through its own account, signing every request
//! with OAuth 1.0a user context (app key pair + the account's access token pair).

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::oauth1::{authorization_header, OAuth1Credentials, RequestStamp};
use crate::{PublishError, Publisher};

pub const DEFAULT_X_API_BASE: &str = "https://api.x.com";

/// Credentials of one persona's X account.
#[derive(Debug, Clone)]
pub struct XAccount {
    pub persona_key: String,
    pub credentials: OAuth1Credentials,
}

#[derive(Serialize)]
struct CreateTweet<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct CreateTweetResponse {
    data: TweetData,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
}

#[derive(Deserialize)]
struct ApiProblem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Posts through `POST {api_base}/2/tweets`.
pub struct XPublisher {
    http: reqwest::Client,
    api_base: String,
    accounts: HashMap<String, XAccount>,
}

impl XPublisher {
    /// `api_base` is normally [`DEFAULT_X_API_BASE`]; tests and proxies point it elsewhere.
    pub fn with_api_base(accounts: impl IntoIterator<Item = XAccount>, api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            accounts: accounts
                .into_iter()
                .map(|a| (a.persona_key.clone(), a))
                .collect(),
        }
    }

    /// Public link for a post id.
    pub fn status_url(id: &str) -> String {
        format!("https://x.com/i/web/status/{}", id)
    }
}

#[async_trait]
impl Publisher for XPublisher {
    #[instrument(skip(self, text), fields(text_len = text.chars().count()))]
    async fn publish(&self, persona_key: &str, text: &str) -> Result<String, PublishError> {
        let account = self
            .accounts
            .get(persona_key)
            .ok_or_else(|| PublishError::NotConfigured(persona_key.to_string()))?;

        info!(persona = %persona_key, "Posting to X");

        let endpoint = format!("{}/2/tweets", self.api_base);
        let authorization =
            authorization_header(&account.credentials, "POST", &endpoint, &RequestStamp::now())?;

        let response = self
            .http
            .post(&endpoint)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .json(&CreateTweet { text })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ApiProblem>(&body)
                .ok()
                .and_then(|p| p.detail.or(p.title))
                .unwrap_or(body);
            error!(persona = %persona_key, status = status.as_u16(), detail = %detail, "X API rejected post");
            return Err(PublishError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let created: CreateTweetResponse = serde_json::from_str(&body)
            .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;
        let url = Self::status_url(&created.data.id);
        info!(persona = %persona_key, url = %url, "Posted to X");
        Ok(url)
    }
}
