use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub role: String,
    /// Tri-state: `None` is treated as active. Only account-management
    /// flows outside this service flip it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_disabled(&self) -> bool {
        self.is_active == Some(false)
    }
}

/// Registration input before the service assigns an id, hashes the
/// password, and stamps timestamps.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub role: String,
    pub is_active: Option<bool>,
}
