use sqlx::SqlitePool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::auth::JwtService;
use crate::auth::oauth::{GoogleProvider, IdentityProvider};
use crate::core::{Config, ServerResult};
use crate::db::DbService;
use crate::db::repository::user;
use crate::live::LiveHub;

/// Server state shared by every handler
///
/// Cloning is cheap: the pool, hub and services are reference counted.
///
/// | field | purpose |
/// |-------|---------|
/// | config | immutable configuration |
/// | pool | SQLite pool |
/// | jwt_service | token issue/validation |
/// | live | realtime fan-out |
/// | identity | federated login provider |
/// | shutdown | cancelled on graceful shutdown; WS sessions watch it |
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub live: LiveHub,
    pub identity: Arc<dyn IdentityProvider>,
    pub shutdown: CancellationToken,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("environment", &self.config.environment)
            .field("live_receivers", &self.live.receiver_count())
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// Build state from parts (tests inject a pool and a mock provider)
    pub fn new(config: Config, pool: SqlitePool, identity: Arc<dyn IdentityProvider>) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        Self {
            config: Arc::new(config),
            pool,
            jwt_service,
            live: LiveHub::new(),
            identity,
            shutdown: CancellationToken::new(),
        }
    }

    /// Open the database, apply migrations and provision the bootstrap admin
    pub async fn initialize(config: Config) -> ServerResult<Self> {
        let db = DbService::connect(&config.database_url).await?;

        if let Some(email) = config.admin_email.as_deref() {
            let admin = user::ensure_admin(&db.pool, email)
                .await
                .map_err(|e| crate::core::ServerError::Database(e.to_string()))?;
            tracing::info!(user_id = admin.id, email = %admin.email, "Bootstrap admin ensured");
        }

        if !config.google.is_configured() {
            tracing::warn!("Google OAuth is not configured; federated login is disabled");
        }
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(GoogleProvider::new(config.google.clone()));

        Ok(Self::new(config, db.pool, identity))
    }
}
