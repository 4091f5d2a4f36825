//! Identity persistence.
//!
//! The issuance service talks to storage only through [`IdentityStore`];
//! Postgres and in-memory implementations live here.

pub mod memory;
pub mod models;
pub mod operations;

use async_trait::async_trait;

use crate::error::DatabaseError;

pub use memory::MemoryIdentityStore;
pub use models::{Identity, NewIdentity};
pub use operations::DbOperations;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Hashes the password and persists a new identity.
    /// Fails with [`DatabaseError::Duplicate`] when the email is taken.
    async fn create(&self, new_identity: &NewIdentity) -> Result<Identity, DatabaseError>;

    /// Fails with [`DatabaseError::NotFound`] when no identity has `email`.
    async fn find_by_email(&self, email: &str) -> Result<Identity, DatabaseError>;
}
