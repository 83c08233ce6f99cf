pub mod auth;
pub mod config;
pub mod error;
pub mod store;

use std::sync::Arc;

use actix_web::HttpResponse;
use sqlx::postgres::PgPoolOptions;

pub use config::Settings;
pub use error::{AppError, AuthError, StoreError};
pub type Result<T> = std::result::Result<T, AppError>;

pub use auth::{AuthService, Claims, RateLimitConfig, RateLimiter, TokenCodec};
pub use store::{NewUser, User, UserStore};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all request workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub auth_service: AuthService,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database.url)
            .await
            .map_err(|e| AppError::Store(StoreError::Unavailable(e.to_string())))?;

        let store = Arc::new(store::postgres::PgUserStore::new(Arc::new(pool)));

        Ok(Self::with_store(config, store))
    }

    /// Assemble state over any user store. Tests use this to run the full
    /// HTTP surface against an in-memory store.
    pub fn with_store(config: Settings, store: Arc<dyn UserStore>) -> Self {
        let codec = TokenCodec::new(&config.auth.jwt_secret);

        let auth_service = AuthService::new(
            store,
            codec,
            chrono::Duration::seconds(config.auth.access_ttl_secs as i64),
            chrono::Duration::seconds(config.auth.refresh_ttl_secs as i64),
        );

        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            burst: config.rate_limit.burst,
            idle_ttl: chrono::Duration::seconds(config.rate_limit.idle_ttl_secs as i64),
            sweep_interval: std::time::Duration::from_secs(config.rate_limit.sweep_interval_secs),
        }));

        Self {
            config: Arc::new(config),
            auth_service,
            rate_limiter,
        }
    }
}
