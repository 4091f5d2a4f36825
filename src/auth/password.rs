use std::sync::Arc;

use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier, Version};
use rand::rngs::OsRng;
use tokio::task;

use crate::config::AuthConfig;
use crate::error::PasswordError;

// Hashed once per hasher so unknown-email logins pay the same cost as
// wrong-password logins.
const DUMMY_PASSWORD: &str = "dummy-password-for-unknown-accounts";

/// Argon2id hashing and constant-time verification of account passwords.
///
/// The async methods run argon2 on tokio's blocking pool; the `_blocking`
/// variants are for callers already off the runtime.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| PasswordError::Primitive(e.to_string()))?;
        let dummy_hash = hash_with(&params, DUMMY_PASSWORD)?;

        Ok(Self {
            params,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub fn from_config(auth: &AuthConfig) -> Result<Self, PasswordError> {
        Self::new(auth.argon2_memory_kib, auth.argon2_iterations, auth.argon2_parallelism)
    }

    /// Hashes `plaintext` into a PHC string with a fresh random salt.
    pub fn hash_blocking(&self, plaintext: &str) -> Result<String, PasswordError> {
        hash_with(&self.params, plaintext)
    }

    /// Returns `Ok(false)` on mismatch and `Err` when the comparison itself
    /// could not run. Parameters embedded in `stored_hash` take precedence.
    pub fn verify_blocking(&self, plaintext: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

        match argon2_with(&self.params).verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::Primitive(e.to_string())),
        }
    }

    pub async fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let hasher = self.clone();
        let plaintext = plaintext.to_string();
        task::spawn_blocking(move || hasher.hash_blocking(&plaintext))
            .await
            .map_err(|e| PasswordError::Primitive(e.to_string()))?
    }

    pub async fn verify(&self, plaintext: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        let hasher = self.clone();
        let plaintext = plaintext.to_string();
        let stored_hash = stored_hash.to_string();
        task::spawn_blocking(move || hasher.verify_blocking(&plaintext, &stored_hash))
            .await
            .map_err(|e| PasswordError::Primitive(e.to_string()))?
    }

    /// Runs a full verification against a fixed hash and discards the
    /// outcome. Used when there is no stored hash to compare against.
    pub async fn verify_dummy(&self, plaintext: &str) {
        let dummy_hash = self.dummy_hash.clone();
        let _ = self.verify(plaintext, &dummy_hash).await;
    }
}

fn argon2_with(params: &Params) -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
}

fn hash_with(params: &Params, plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2_with(params)
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Primitive(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(8, 1, 1).unwrap()
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = hasher();
        let hash = hasher.hash("correct horse").await.unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse", &hash).await.unwrap());
        assert!(!hasher.verify("battery staple", &hash).await.unwrap());
    }

    #[test]
    fn test_blocking_variants_agree() {
        let hasher = hasher();
        let hash = hasher.hash_blocking("correct horse").unwrap();

        assert!(hasher.verify_blocking("correct horse", &hash).unwrap());
        assert!(!hasher.verify_blocking("battery staple", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let hasher = hasher();
        let a = hasher.hash("same").await.unwrap();
        let b = hasher.hash("same").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_malformed_hash_is_an_error() {
        let result = hasher().verify("password", "not-a-phc-string").await;
        assert!(matches!(result, Err(PasswordError::MalformedHash(_))));
    }

    #[test]
    fn test_dummy_hash_uses_configured_params() {
        let hasher = PasswordHasher::new(16, 2, 1).unwrap();
        let parsed = PasswordHash::new(&hasher.dummy_hash).unwrap();
        let params = Params::try_from(&parsed).unwrap();

        assert_eq!(params.m_cost(), 16);
        assert_eq!(params.t_cost(), 2);
        assert!(!hasher.verify_blocking("password123", &hasher.dummy_hash).unwrap());
    }

    #[test]
    fn test_invalid_params() {
        assert!(PasswordHasher::new(0, 0, 0).is_err());
    }
}
