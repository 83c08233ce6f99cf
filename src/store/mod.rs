//! User persistence boundary.
//!
//! The authentication core only talks to this trait; the Postgres
//! implementation lives in `postgres` and tests substitute their own.

mod models;
pub mod postgres;

pub use models::{NewUser, User};

use crate::error::StoreError;
use async_trait::async_trait;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user. The store enforces email uniqueness and
    /// reports a duplicate as `StoreError::DuplicateEmail`.
    async fn create(&self, user: &User) -> Result<(), StoreError>;

    /// Lookup by email, exact-match and case-sensitive.
    async fn get_by_email(&self, email: &str) -> Result<User, StoreError>;

    async fn get_by_id(&self, user_id: Uuid) -> Result<User, StoreError>;
}
