use std::sync::Arc;

use tracing::{error, info, warn};

use super::claims::Claims;
use super::password::PasswordHasher;
use super::token::{TokenConfig, TokenPair, TokenSigner, TOKEN_SCOPE, TOKEN_TYPE};
use crate::db::{IdentityStore, NewIdentity};
use crate::error::{AppError, AuthError, DatabaseError, TokenError};
use crate::Result;

/// Registration and login flows ending in a signed access/refresh pair.
///
/// Holds no mutable state; the identity store is the only shared resource.
pub struct TokenIssuanceService {
    store: Arc<dyn IdentityStore>,
    hasher: PasswordHasher,
    signer: TokenSigner,
    config: TokenConfig,
}

impl TokenIssuanceService {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        hasher: PasswordHasher,
        config: TokenConfig,
    ) -> std::result::Result<Self, TokenError> {
        let signer = TokenSigner::from_config(&config)?;
        Ok(Self {
            store,
            hasher,
            signer,
            config,
        })
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<TokenPair> {
        let identity = self
            .store
            .create(&NewIdentity::new(name, email, password))
            .await
            .map_err(|e| match e {
                DatabaseError::Duplicate => {
                    info!("Registration rejected, email already in use: {}", email);
                    AppError::AuthError(AuthError::CredentialConflict)
                }
                other => {
                    error!("Identity store failed during registration for {}: {}", email, other);
                    AppError::DatabaseError(other)
                }
            })?;

        info!("Registered identity {} for {}", identity.id, email);
        self.generate_token_pair(&identity.id)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let identity = match self.store.find_by_email(email).await {
            Ok(identity) => identity,
            Err(DatabaseError::NotFound) => {
                // Same argon2 cost as a wrong password, so timing does not
                // reveal whether the account exists.
                self.hasher.verify_dummy(password).await;
                warn!("Login failed, unknown email: {}", email);
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => {
                error!("Identity store failed during login for {}: {}", email, e);
                return Err(e.into());
            }
        };

        match self.hasher.verify(password, &identity.password_hash).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Login failed, wrong password for identity {}", identity.id);
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => {
                error!("Password verification errored for identity {}: {}", identity.id, e);
                return Err(AuthError::InvalidCredentials.into());
            }
        }

        info!("Login succeeded for identity {}", identity.id);
        self.generate_token_pair(&identity.id)
    }

    /// Signs an access and a refresh token for `subject`. Both tokens are
    /// produced synchronously, so callers see either the full pair or an error.
    pub fn generate_token_pair(&self, subject: &str) -> Result<TokenPair> {
        let access_token = self
            .signer
            .issue(subject, self.config.access_token_lifetime)
            .map_err(|e| self.signing_failure(subject, e))?;
        let refresh_token = self
            .signer
            .issue(subject, self.config.refresh_token_lifetime)
            .map_err(|e| self.signing_failure(subject, e))?;

        Ok(TokenPair {
            token_type: TOKEN_TYPE.to_string(),
            expires_in: self.config.access_token_lifetime.num_seconds(),
            scope: TOKEN_SCOPE.to_string(),
            access_token,
            refresh_token,
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        Ok(self.signer.verify(token)?)
    }

    fn signing_failure(&self, subject: &str, err: TokenError) -> AppError {
        error!("Token signing failed for subject {}: {}", subject, err);
        match err {
            TokenError::SigningFailure(_) => AppError::TokenError(err),
            other => AppError::TokenError(TokenError::SigningFailure(other.to_string())),
        }
    }
}
