use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{Identity, NewIdentity};
use super::IdentityStore;
use crate::auth::PasswordHasher;
use crate::error::DatabaseError;

/// Process-local identity store keyed by email.
pub struct MemoryIdentityStore {
    identities: RwLock<HashMap<String, Identity>>,
    hasher: PasswordHasher,
}

impl MemoryIdentityStore {
    pub fn new(hasher: PasswordHasher) -> Self {
        Self {
            identities: RwLock::new(HashMap::new()),
            hasher,
        }
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn create(&self, new_identity: &NewIdentity) -> Result<Identity, DatabaseError> {
        if self.identities.read().await.contains_key(&new_identity.email) {
            return Err(DatabaseError::Duplicate);
        }

        // Hash outside the write lock; uniqueness is rechecked below.
        let password_hash = self
            .hasher
            .hash(&new_identity.password)
            .await
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        let mut identities = self.identities.write().await;
        if identities.contains_key(&new_identity.email) {
            return Err(DatabaseError::Duplicate);
        }

        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            name: new_identity.name.clone(),
            email: new_identity.email.clone(),
            password_hash,
            created_at: Utc::now(),
        };
        identities.insert(identity.email.clone(), identity.clone());

        Ok(identity)
    }

    async fn find_by_email(&self, email: &str) -> Result<Identity, DatabaseError> {
        self.identities
            .read()
            .await
            .get(email)
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }
}
