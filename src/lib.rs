pub mod auth;
pub mod config;
pub mod db;
pub mod error;

use std::sync::Arc;
use std::time::Duration;
use actix_web::HttpResponse;
use tracing::info;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{Claims, PasswordHasher, TokenConfig, TokenIssuanceService, TokenPair, TokenSigner};
pub use db::{DbOperations, Identity, IdentityStore, MemoryIdentityStore, NewIdentity};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub auth_service: Arc<TokenIssuanceService>,
}

impl AppState {
    /// Builds the identity store selected by `database.in_memory` and the
    /// issuance service on top of it.
    pub async fn new(config: Settings) -> Result<Self> {
        let hasher = PasswordHasher::from_config(&config.auth)?;

        let store: Arc<dyn IdentityStore> = if config.database.in_memory {
            info!("Using in-memory identity store");
            Arc::new(MemoryIdentityStore::new(hasher.clone()))
        } else {
            let db = DbOperations::new_with_options(
                &config.database.url,
                config.database.max_connections,
                Duration::from_secs(config.database.acquire_timeout_secs),
                hasher.clone(),
            )
            .await?;
            db.run_migrations().await?;
            Arc::new(db)
        };

        Self::with_store(config, store, hasher)
    }

    pub fn with_store(
        config: Settings,
        store: Arc<dyn IdentityStore>,
        hasher: PasswordHasher,
    ) -> Result<Self> {
        let token_config = config.token_config()?;
        let auth_service = TokenIssuanceService::new(store, hasher, token_config)?;

        Ok(Self {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
        })
    }
}
