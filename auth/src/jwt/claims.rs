use chrono::Duration;
use serde::Deserialize;
use serde::Serialize;

/// Session token claims.
///
/// Every token issued by this crate carries a subject, an issue time and an
/// absolute expiry. Timestamps are Unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (account identifier)
    pub sub: String,

    /// Issued at
    pub iat: i64,

    /// Expiration time
    pub exp: i64,
}

impl Claims {
    /// Create claims for `subject` issued at `issued_at` and valid for `ttl`.
    pub fn new(subject: impl ToString, issued_at: i64, ttl: Duration) -> Self {
        Self {
            sub: subject.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl.num_seconds()),
        }
    }

    /// Subject the token was issued to.
    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Check if token is expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }
}
