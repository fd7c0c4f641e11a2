//! # Callback tokens
//!
//! Encodes the target of a menu action (which session, and for persona/variant picks which index)
//! into the opaque string carried by the transport's callback payload, and decodes it back.
//!
//! ## Format
//!
//! - indexed kinds: `{tag}:{index}:{escaped_session_id}`
//! - plain kinds: `{tag}:{escaped_session_id}`
//!
//! Tags: `p` persona, `v` variant, `c` confirm/publish, `x` cancel. In the session id `\` is written
//! as `\\` and `:` as `\:`, so decoding never has to guess where the id ends: the tag stops at the
//! first `:`, the index (digits only) at the next one, and everything after is the id.

use std::fmt;

use thiserror::Error;

/// Telegram limits callback data to 64 bytes.
pub const MAX_TOKEN_BYTES: usize = 64;

const SEPARATOR: char = ':';
const ESCAPE: char = '\\';

/// Why a token could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Tag not produced by this codec; the event should be ignored.
    #[error("unknown callback kind: {0}")]
    UnknownKind(String),
    #[error("malformed callback token: {0}")]
    Malformed(String),
    #[error("invalid index in callback token: {0}")]
    InvalidIndex(String),
    #[error("invalid escape sequence in session id: {0}")]
    InvalidEscape(String),
}

/// The action a menu button stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallbackToken {
    /// Pick the persona at `persona` (position in the configured list).
    SelectPersona { session_id: String, persona: usize },
    /// Pick the generated variant at `index`.
    SelectVariant { session_id: String, index: usize },
    /// Publish the chosen text.
    Publish { session_id: String },
    /// Drop the session.
    Cancel { session_id: String },
}

impl CallbackToken {
    pub fn session_id(&self) -> &str {
        match self {
            CallbackToken::SelectPersona { session_id, .. }
            | CallbackToken::SelectVariant { session_id, .. }
            | CallbackToken::Publish { session_id }
            | CallbackToken::Cancel { session_id } => session_id,
        }
    }

    fn tag(&self) -> char {
        match self {
            CallbackToken::SelectPersona { .. } => 'p',
            CallbackToken::SelectVariant { .. } => 'v',
            CallbackToken::Publish { .. } => 'c',
            CallbackToken::Cancel { .. } => 'x',
        }
    }

    fn index(&self) -> Option<usize> {
        match self {
            CallbackToken::SelectPersona { persona, .. } => Some(*persona),
            CallbackToken::SelectVariant { index, .. } => Some(*index),
            CallbackToken::Publish { .. } | CallbackToken::Cancel { .. } => None,
        }
    }

    /// Serializes the token.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(self.session_id().len() + 8);
        out.push(self.tag());
        out.push(SEPARATOR);
        if let Some(index) = self.index() {
            out.push_str(&index.to_string());
            out.push(SEPARATOR);
        }
        escape_into(self.session_id(), &mut out);
        out
    }

    /// Parses a token produced by [`CallbackToken::encode`].
    pub fn decode(token: &str) -> Result<Self, TokenError> {
        let (tag, rest) = token
            .split_once(SEPARATOR)
            .ok_or_else(|| TokenError::Malformed(token.to_string()))?;

        match tag {
            "p" | "v" => {
                let (index, id) = rest
                    .split_once(SEPARATOR)
                    .ok_or_else(|| TokenError::Malformed(token.to_string()))?;
                if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(TokenError::InvalidIndex(index.to_string()));
                }
                let index: usize = index
                    .parse()
                    .map_err(|_| TokenError::InvalidIndex(index.to_string()))?;
                let session_id = unescape(id)?;
                Ok(if tag == "p" {
                    CallbackToken::SelectPersona {
                        session_id,
                        persona: index,
                    }
                } else {
                    CallbackToken::SelectVariant { session_id, index }
                })
            }
            "c" => Ok(CallbackToken::Publish {
                session_id: unescape(rest)?,
            }),
            "x" => Ok(CallbackToken::Cancel {
                session_id: unescape(rest)?,
            }),
            other => Err(TokenError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl std::str::FromStr for CallbackToken {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

fn escape_into(id: &str, out: &mut String) {
    for c in id.chars() {
        if c == ESCAPE || c == SEPARATOR {
            out.push(ESCAPE);
        }
        out.push(c);
    }
}

fn unescape(raw: &str) -> Result<String, TokenError> {
    if raw.is_empty() {
        return Err(TokenError::Malformed("empty session id".to_string()));
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            ESCAPE => match chars.next() {
                Some(next @ (ESCAPE | SEPARATOR)) => out.push(next),
                _ => return Err(TokenError::InvalidEscape(raw.to_string())),
            },
            // A bare separator can only come from a token this codec did not write.
            SEPARATOR => return Err(TokenError::InvalidEscape(raw.to_string())),
            _ => out.push(c),
        }
    }
    Ok(out)
}
