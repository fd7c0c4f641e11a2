//! OAuth 1.0a user-context signing (HMAC-SHA1), as X expects for posting on behalf of an account.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::PublishError;

type HmacSha1 = Hmac<Sha1>;

/// App key pair plus the account's access token pair.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuth1Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl fmt::Debug for OAuth1Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth1Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"***")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"***")
            .finish()
    }
}

/// Nonce and timestamp of one signed request.
#[derive(Debug, Clone)]
pub struct RequestStamp {
    pub nonce: String,
    pub timestamp: i64,
}

impl RequestStamp {
    pub fn now() -> Self {
        Self {
            nonce: uuid::Uuid::new_v4().simple().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// RFC 3986 encoding: everything but `A-Z a-z 0-9 - . _ ~`.
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Signature over the method, the base URL and every oauth + request parameter (`params` holds
/// query or form parameters; a JSON body is not signed).
pub fn sign(
    credentials: &OAuth1Credentials,
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    stamp: &RequestStamp,
) -> Result<String, PublishError> {
    let timestamp = stamp.timestamp.to_string();
    let mut pairs: Vec<(String, String)> = oauth_params(credentials, stamp, &timestamp)
        .into_iter()
        .chain(params.iter().copied())
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    pairs.sort();
    let param_string = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let base = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&param_string)
    );
    let key = format!(
        "{}&{}",
        encode(&credentials.consumer_secret),
        encode(&credentials.access_token_secret)
    );

    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| PublishError::Signing(e.to_string()))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// `Authorization` header value for a request without signed parameters.
pub fn authorization_header(
    credentials: &OAuth1Credentials,
    method: &str,
    url: &str,
    stamp: &RequestStamp,
) -> Result<String, PublishError> {
    let signature = sign(credentials, method, url, &[], stamp)?;
    let timestamp = stamp.timestamp.to_string();
    let mut fields = oauth_params(credentials, stamp, &timestamp);
    fields.push(("oauth_signature", signature.as_str()));
    fields.sort();
    let rendered = fields
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {}", rendered))
}

fn oauth_params<'a>(
    credentials: &'a OAuth1Credentials,
    stamp: &'a RequestStamp,
    timestamp: &'a str,
) -> Vec<(&'a str, &'a str)> {
    vec![
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", stamp.nonce.as_str()),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", "1.0"),
    ]
}
