use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

// https://datatracker.ietf.org/doc/html/rfc6749#section-5.1
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: SmolStr,
    #[serde(default = "default_token_type")]
    pub token_type: SmolStr,
    #[serde(default)]
    pub refresh_token: Option<SmolStr>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<SmolStr>,
}

fn default_token_type() -> SmolStr {
    SmolStr::new_static("Bearer")
}

/// Token pair held by a [`Session`](crate::session::Session).
///
/// `expires_at` is fixed when the set is created and never recomputed.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: SmolStr,
    pub refresh_token: Option<SmolStr>,
    pub token_type: SmolStr,
    pub scope: Option<SmolStr>,
    pub expires_in: Option<i64>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

// Largest lifetime TimeDelta::try_seconds accepts.
const MAX_EXPIRES_IN: i64 = i64::MAX / 1_000;

impl TokenSet {
    pub fn from_response(response: TokenResponse, issued_at: DateTime<Utc>) -> Self {
        let expires_at = response.expires_in.map(|secs| {
            TimeDelta::try_seconds(secs.clamp(0, MAX_EXPIRES_IN))
                .and_then(|delta| issued_at.checked_add_signed(delta))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        });
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.filter(|t| !t.is_empty()),
            token_type: response.token_type,
            scope: response.scope,
            expires_in: response.expires_in,
            issued_at,
            expires_at,
        }
    }

    /// True once `now` is within `skew` of expiry. A set without a known
    /// lifetime never expires.
    pub fn is_expiring(&self, now: DateTime<Utc>, skew: TimeDelta) -> bool {
        self.expires_at.is_some_and(|at| {
            let threshold = at.checked_sub_signed(skew).unwrap_or(at);
            now >= threshold
        })
    }

    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl From<TokenResponse> for TokenSet {
    fn from(response: TokenResponse) -> Self {
        Self::from_response(response, Utc::now())
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("expires_in", &self.expires_in)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
