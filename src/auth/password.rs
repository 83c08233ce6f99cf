//! One-way salted password hashing.
//!
//! bcrypt digests are self-describing (algorithm, cost, salt and hash in
//! one string), so verification needs no separately stored salt.

use crate::error::AppError;

/// Hash a password with the default bcrypt work factor.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Verify a password against a stored digest. Returns false on mismatch
/// and on malformed digests; verification never errors outward.
pub fn verify_password(password: &str, digest: &str) -> bool {
    bcrypt::verify(password, digest).unwrap_or(false)
}
