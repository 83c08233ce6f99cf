//! Authentication core: credential hashing, token lifecycle, the
//! register/login/refresh/profile operations, and the admission
//! controller that guards the credential endpoints.

pub mod handlers;
pub mod password;
mod rate_limit;
mod service;
mod token;

pub use rate_limit::{Decision, RateLimitConfig, RateLimiter, SweeperHandle};
pub use service::AuthService;
pub use token::{Claims, TokenCodec};

use uuid::Uuid;

/// Identity established from a validated bearer token. Passed explicitly
/// to protected operations instead of riding in ambient request state.
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
}
