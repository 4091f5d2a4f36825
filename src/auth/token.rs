use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::claims::Claims;
use crate::config::AuthConfig;
use crate::error::TokenError;

pub const TOKEN_TYPE: &str = "Bearer";
pub const TOKEN_SCOPE: &str = "read write";

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Immutable issuance configuration, established once at startup.
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub issuer: String,
    pub access_token_lifetime: Duration,
    pub refresh_token_lifetime: Duration,
}

impl TokenConfig {
    pub fn new(
        secret: impl Into<String>,
        issuer: impl Into<String>,
        access_token_lifetime: Duration,
        refresh_token_lifetime: Duration,
    ) -> Result<Self, TokenError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        // Claims carry whole seconds; anything shorter would be born expired.
        if access_token_lifetime.num_seconds() <= 0 || refresh_token_lifetime.num_seconds() <= 0 {
            return Err(TokenError::InvalidExpiry);
        }

        Ok(Self {
            secret,
            issuer: issuer.into(),
            access_token_lifetime,
            refresh_token_lifetime,
        })
    }
}

impl TryFrom<&AuthConfig> for TokenConfig {
    type Error = TokenError;

    fn try_from(auth: &AuthConfig) -> Result<Self, Self::Error> {
        let access = Duration::try_hours(auth.access_token_expiry_hours)
            .ok_or(TokenError::InvalidExpiry)?;
        let refresh = Duration::try_hours(auth.refresh_token_expiry_hours)
            .ok_or(TokenError::InvalidExpiry)?;

        TokenConfig::new(auth.token_secret.clone(), auth.token_issuer.clone(), access, refresh)
    }
}

// The secret stays out of logs.
impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("access_token_lifetime", &self.access_token_lifetime)
            .field("refresh_token_lifetime", &self.refresh_token_lifetime)
            .finish()
    }
}

/// Issuance result returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub token_type: String,
    pub expires_in: i64,
    pub scope: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and verifies compact HS256 tokens with a shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenSigner {
    pub fn new(secret: &str, issuer: &str) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        Ok(Self {
            issuer: issuer.to_string(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn from_config(config: &TokenConfig) -> Result<Self, TokenError> {
        Self::new(&config.secret, &config.issuer)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| TokenError::SigningFailure(e.to_string()))
    }

    /// Builds a fresh claim set for `subject` and signs it.
    pub fn issue(&self, subject: &str, expiry: Duration) -> Result<String, TokenError> {
        let claims = Claims::new(subject, &self.issuer, expiry)?;
        self.sign(&claims)
    }

    /// Checks signature, issuer, `exp` and `nbf` with no leeway.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match TokenError::from(e) {
                TokenError::Expired => TokenError::Expired,
                TokenError::InvalidToken(msg) | TokenError::SigningFailure(msg) => {
                    TokenError::InvalidToken(msg)
                }
                other => TokenError::InvalidToken(other.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn signer() -> TokenSigner {
        TokenSigner::new("s3cr3t", "OAuth-server").unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let signer = signer();
        let token = signer.issue("user-1", Duration::hours(10)).unwrap();

        assert_eq!(token.split('.').count(), 3);

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.iss, "OAuth-server");
        assert_eq!(claims.expiry(), Duration::hours(10));
    }

    #[test]
    fn test_resigning_same_claims_verifies() {
        let signer = signer();
        let claims = Claims::new("user-1", "OAuth-server", Duration::hours(1)).unwrap();

        let first = signer.sign(&claims).unwrap();
        let second = signer.sign(&claims).unwrap();

        assert_eq!(first, second);
        assert_eq!(signer.verify(&second).unwrap(), claims);
    }

    #[test]
    fn test_any_single_byte_change_is_rejected() {
        let signer = signer();
        let token = signer.issue("user-1", Duration::hours(1)).unwrap();

        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            assert!(
                signer.verify(&tampered).is_err(),
                "tampered token at byte {} verified",
                i
            );
        }
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = signer().issue("user-1", Duration::hours(1)).unwrap();
        let other = TokenSigner::new("other-secret", "OAuth-server").unwrap();

        assert!(matches!(other.verify(&token), Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let token = signer().issue("user-1", Duration::hours(1)).unwrap();
        let other = TokenSigner::new("s3cr3t", "someone-else").unwrap();

        assert!(matches!(other.verify(&token), Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = signer();
        let mut claims = Claims::new("user-1", "OAuth-server", Duration::hours(1)).unwrap();
        let past = Utc::now().timestamp() - 7200;
        claims.iat = past;
        claims.nbf = past;
        claims.exp = past + 60;

        let token = signer.sign(&claims).unwrap();
        assert_eq!(signer.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_future_not_before_rejected() {
        let signer = signer();
        let mut claims = Claims::new("user-1", "OAuth-server", Duration::hours(2)).unwrap();
        claims.nbf = Utc::now().timestamp() + 3600;

        let token = signer.sign(&claims).unwrap();
        assert!(matches!(signer.verify(&token), Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(TokenSigner::new("", "iss"), Err(TokenError::MissingSecret)));
    }

    #[test]
    fn test_token_config_validation() {
        let ok = TokenConfig::new("s3cr3t", "iss", Duration::hours(10), Duration::hours(100));
        assert!(ok.is_ok());

        let missing = TokenConfig::new("", "iss", Duration::hours(10), Duration::hours(100));
        assert_eq!(missing.unwrap_err(), TokenError::MissingSecret);

        let zero = TokenConfig::new("s3cr3t", "iss", Duration::hours(10), Duration::zero());
        assert_eq!(zero.unwrap_err(), TokenError::InvalidExpiry);

        let sub_second =
            TokenConfig::new("s3cr3t", "iss", Duration::milliseconds(500), Duration::hours(100));
        assert_eq!(sub_second.unwrap_err(), TokenError::InvalidExpiry);
    }

    #[test]
    fn test_token_config_rejects_oversized_lifetime() {
        let auth = AuthConfig {
            token_secret: "s3cr3t".to_string(),
            token_issuer: "OAuth-server".to_string(),
            access_token_expiry_hours: i64::MAX,
            refresh_token_expiry_hours: 100,
            argon2_memory_kib: 8,
            argon2_iterations: 1,
            argon2_parallelism: 1,
        };
        assert_eq!(TokenConfig::try_from(&auth).unwrap_err(), TokenError::InvalidExpiry);

        let auth = AuthConfig {
            access_token_expiry_hours: 10,
            refresh_token_expiry_hours: i64::MIN,
            ..auth
        };
        assert_eq!(TokenConfig::try_from(&auth).unwrap_err(), TokenError::InvalidExpiry);
    }

    #[test]
    fn test_token_config_debug_redacts_secret() {
        let config =
            TokenConfig::new("s3cr3t", "iss", Duration::hours(10), Duration::hours(100)).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("<redacted>"));
    }
}
