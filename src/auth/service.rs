use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::auth::password;
use crate::auth::token::TokenCodec;
use crate::error::{AppError, AuthError, StoreError};
use crate::store::{NewUser, User, UserStore};

/// Orchestrates registration, login, token refresh, and profile lookup
/// over the user store and token codec.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    codec: TokenCodec,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        codec: TokenCodec,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            store,
            codec,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Register a new account and return its id.
    ///
    /// The existence check and the insert are not one transaction; a
    /// concurrent duplicate slips past the check and is rejected by the
    /// store's unique email constraint instead.
    pub async fn register(&self, new_user: NewUser, password: &str) -> Result<Uuid, AppError> {
        match self.store.get_by_email(&new_user.email).await {
            Ok(_) => return Err(StoreError::DuplicateEmail.into()),
            Err(StoreError::NotFound) => {}
            // A failed lookup is not proof of a free email; abort rather
            // than risk a duplicate insert attempt.
            Err(e) => return Err(e.into()),
        }

        let password_hash = password::hash_password(password)?;

        let now = Utc::now();
        let user = User {
            user_id: Uuid::new_v4(),
            email: new_user.email,
            password_hash,
            full_name: new_user.full_name,
            phone_number: new_user.phone_number,
            role: new_user.role,
            is_active: Some(new_user.is_active.unwrap_or(true)),
            created_at: now,
            updated_at: now,
        };

        self.store.create(&user).await?;

        Ok(user.user_id)
    }

    /// Authenticate credentials and return (access_token, refresh_token).
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, String), AppError> {
        let user = match self.store.get_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                // Indistinguishable from a wrong password, so callers
                // cannot probe which emails are registered.
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e.into()),
        };

        if user.is_disabled() {
            return Err(AuthError::AccountDisabled.into());
        }

        if !password::verify_password(password, &user.password_hash) {
            warn!("Failed login attempt for email: {}", email);
            return Err(AuthError::InvalidCredentials.into());
        }

        // Both tokens or neither; a refresh failure fails the whole login.
        let access_token = self.issue_access_token(&user)?;
        let refresh_token = self.codec.issue(
            &user.user_id.to_string(),
            &user.email,
            &user.role,
            self.refresh_ttl,
        )?;

        Ok((access_token, refresh_token))
    }

    /// Exchange a valid refresh token for a new access token built from the
    /// current stored record, not the token's denormalized claims. The
    /// refresh token itself stays valid until its own expiry.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        let claims = self.codec.validate(refresh_token)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        let user = match self.store.get_by_id(user_id).await {
            Ok(user) => user,
            // The subject no longer exists; the token no longer grants
            // anything.
            Err(StoreError::NotFound) => return Err(AuthError::InvalidToken.into()),
            Err(e) => return Err(e.into()),
        };

        self.issue_access_token(&user)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<User, AppError> {
        Ok(self.store.get_by_id(user_id).await?)
    }

    fn issue_access_token(&self, user: &User) -> Result<String, AppError> {
        self.codec.issue(
            &user.user_id.to_string(),
            &user.email,
            &user.role,
            self.access_ttl,
        )
    }
}
