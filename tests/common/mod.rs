use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use gatekeeper_server::config::{
    AuthConfig, CorsConfig, DatabaseConfig, RateLimitSettings, ServerConfig,
};
use gatekeeper_server::{AppState, Settings, StoreError, User, UserStore};
use tokio::sync::RwLock;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test_secret";

/// HashMap-backed user store so the HTTP suites run without Postgres.
/// Enforces the same email uniqueness the real schema does.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    /// Overwrite a record in place, for tests that change a user after
    /// tokens were issued.
    #[allow(dead_code)]
    pub async fn update(&self, user: User) {
        self.users.write().await.insert(user.user_id, user);
    }

    #[allow(dead_code)]
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.user_id, user);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_id(&self, user_id: Uuid) -> Result<User, StoreError> {
        self.users
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

pub fn test_settings(burst: u32) -> Settings {
    Settings {
        environment: "test".to_string(),
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: 1,
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
        },
        auth: AuthConfig {
            jwt_secret: TEST_SECRET.to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 604_800,
        },
        rate_limit: RateLimitSettings {
            burst,
            idle_ttl_secs: 300,
            sweep_interval_secs: 60,
            trust_forwarded_for: true,
        },
        cors: CorsConfig {
            enabled: false,
            allow_any_origin: false,
            max_age: 3600,
        },
    }
}

pub fn test_state(burst: u32) -> (AppState, Arc<InMemoryUserStore>) {
    let store = Arc::new(InMemoryUserStore::default());
    let state = AppState::with_store(test_settings(burst), store.clone());
    (state, store)
}

/// A user seeded directly into the store, bypassing the register endpoint.
#[allow(dead_code)]
pub fn seeded_user(email: &str, password: &str, is_active: Option<bool>) -> User {
    let now = chrono::Utc::now();
    User {
        user_id: Uuid::new_v4(),
        email: email.to_string(),
        // The minimum bcrypt cost keeps the suite fast.
        password_hash: bcrypt::hash(password, 4).unwrap(),
        full_name: None,
        phone_number: None,
        role: "member".to_string(),
        is_active,
        created_at: now,
        updated_at: now,
    }
}
