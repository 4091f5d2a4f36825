use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::models::{Identity, IdentityRow, NewIdentity};
use super::IdentityStore;
use crate::auth::PasswordHasher;
use crate::error::DatabaseError;

/// Postgres-backed [`IdentityStore`]. Email uniqueness is enforced by the
/// `users_email_key` constraint.
pub struct DbOperations {
    pool: Arc<PgPool>,
    hasher: PasswordHasher,
}

impl DbOperations {
    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
        hasher: PasswordHasher,
    ) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Ok(Self { pool: Arc::new(pool), hasher })
    }

    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for DbOperations {
    async fn create(&self, new_identity: &NewIdentity) -> Result<Identity, DatabaseError> {
        let password_hash = self
            .hasher
            .hash(&new_identity.password)
            .await
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            INSERT INTO users (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_identity.name)
        .bind(&new_identity.email)
        .bind(&password_hash)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_email(&self, email: &str) -> Result<Identity, DatabaseError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Identity::from).ok_or(DatabaseError::NotFound)
    }
}
