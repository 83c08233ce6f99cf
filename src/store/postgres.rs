use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{User, UserStore};

const USER_COLUMNS: &str =
    "user_id, email, password_hash, full_name, phone_number, role, is_active, created_at, updated_at";

pub struct PgUserStore {
    pool: Arc<PgPool>,
}

impl PgUserStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users
            (user_id, email, password_hash, full_name, phone_number, role, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.user_id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.phone_number)
        .bind(&user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(StoreError::from)?;

        Ok(())
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(StoreError::from)
    }

    async fn get_by_id(&self, user_id: Uuid) -> Result<User, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(StoreError::from)
    }
}
