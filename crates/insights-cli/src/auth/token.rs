//! Session token codec. A token is base64 over a small JSON claims object
//! `{userId, expiresAt, random, timestamp}` with millisecond-epoch times.
//! The encoding carries no signature; expiry and the user-id cross-check in
//! the session layer are the only defenses.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const TOKEN_VALIDITY_HOURS: i64 = 24;

const NONCE_LEN: usize = 16;

/// The claims carried inside a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenData {
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Expiry instant, epoch milliseconds.
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
    pub random: String,
    /// Issue instant, epoch milliseconds.
    pub timestamp: i64,
}

impl TokenData {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at
    }
}

/// Mint a fresh token for `user_id`, valid for [TOKEN_VALIDITY_HOURS].
pub fn issue(user_id: &str) -> String {
    let timestamp = Utc::now().timestamp_millis();
    encode(&TokenData {
        user_id: user_id.to_string(),
        expires_at: timestamp + TOKEN_VALIDITY_HOURS * 60 * 60 * 1000,
        random: nonce(),
        timestamp,
    })
}

pub fn encode(data: &TokenData) -> String {
    let json = serde_json::to_string(data).expect("token claims serialize");
    STANDARD.encode(json)
}

/// Decode a token's claims. Expiry is NOT checked here; see [validate].
pub fn decode(token: &str) -> Option<TokenData> {
    let bytes = STANDARD.decode(token).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Decode a token and reject it when expired. Any structural defect counts
/// as an invalid token.
pub fn validate(token: &str) -> Option<TokenData> {
    let data = decode(token)?;
    if data.is_expired(Utc::now().timestamp_millis()) {
        tracing::warn!("session token expired");
        return None;
    }
    Some(data)
}

fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}
