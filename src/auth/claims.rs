use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::TokenError;

/// Claim set carried by every issued token.
///
/// Timestamps are seconds since the Unix epoch. The lifetime handed to
/// [`Claims::new`] is stored as the absolute `exp` instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub jti: String, // Token ID
    pub iss: String, // Issuer
    pub sub: String, // Identity ID
    #[serde(default)]
    pub aud: Vec<String>, // Audience
    pub exp: i64, // Expiration time
    pub nbf: i64, // Not before
    pub iat: i64, // Issued at
    #[serde(default)]
    pub pvt: Vec<Value>, // Private claims
}

impl Claims {
    pub fn new(subject: &str, issuer: &str, expiry: Duration) -> Result<Self, TokenError> {
        let seconds = expiry.num_seconds();
        if seconds <= 0 {
            return Err(TokenError::InvalidExpiry);
        }

        let now = Utc::now().timestamp();
        let exp = now.checked_add(seconds).ok_or(TokenError::InvalidExpiry)?;
        Ok(Self {
            jti: Uuid::new_v4().to_string(),
            iss: issuer.to_string(),
            sub: subject.to_string(),
            aud: Vec::new(),
            exp,
            nbf: now,
            iat: now,
            pvt: Vec::new(),
        })
    }

    pub fn with_audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aud.extend(audience.into_iter().map(Into::into));
        self
    }

    pub fn with_private_claim(mut self, claim: Value) -> Self {
        self.pvt.push(claim);
        self
    }

    /// Lifetime the token was issued with.
    pub fn expiry(&self) -> Duration {
        Duration::seconds(self.exp - self.iat)
    }
}
