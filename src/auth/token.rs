use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AuthError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,   // User ID
    pub email: String,
    pub role: String,
    pub exp: i64,      // Expiration time, epoch seconds
}

/// Signs and verifies claim sets with a single symmetric secret. Holds no
/// mutable state; issuance and validation are pure functions of the input,
/// the secret, and the clock.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // No leeway: a token is expired the instant its exp passes.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(
        &self,
        sub: &str,
        email: &str,
        role: &str,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let claims = Claims {
            sub: sub.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            exp: (Utc::now() + ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(AuthError::from)
    }
}
