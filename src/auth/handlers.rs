use actix_web::{web, HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::rate_limit::Decision;
use crate::auth::AuthenticatedIdentity;
use crate::error::{AppError, AuthError};
use crate::store::NewUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub token_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: u64,
    pub token_type: &'static str,
}

/// Bodies are parsed after admission control so a throttled client is
/// rejected regardless of what it sent.
fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|_| AppError::Validation("Invalid input data".into()))
}

/// Resolve the rate-limit key for a request: the first X-Forwarded-For hop
/// when configured to trust it, otherwise the peer address.
fn client_key(req: &HttpRequest, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        if let Some(forwarded) = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|h| h.to_str().ok())
        {
            if let Some(first) = forwarded.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Admission gate for the credential endpoints. Runs before the operation
/// and independently of any token check.
async fn admit(state: &AppState, req: &HttpRequest) -> Result<(), AppError> {
    let key = client_key(req, state.config.rate_limit.trust_forwarded_for);
    match state.rate_limiter.check_and_consume(&key).await {
        Decision::Allowed => Ok(()),
        Decision::Throttled => {
            warn!("Throttled request from {}", key);
            Err(AppError::RateLimited)
        }
    }
}

/// Parse the bearer token from the Authorization header and validate it
/// into a typed identity, which callers thread explicitly into the core.
fn authenticate_request(
    req: &HttpRequest,
    state: &AppState,
) -> Result<AuthenticatedIdentity, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;

    let claims = state.auth_service.codec().validate(token)?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

    Ok(AuthenticatedIdentity {
        user_id,
        email: claims.email,
        role: claims.role,
    })
}

pub async fn register(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    admit(&state, &req).await?;

    let body: RegisterRequest = parse_json(&body)?;
    if body.email.is_empty() || body.password.is_empty() {
        return Err(AppError::Validation("email and password are required".into()));
    }

    info!("Received registration request for email: {}", body.email);

    let new_user = NewUser {
        email: body.email,
        full_name: body.full_name,
        phone_number: body.phone_number,
        role: body.role.unwrap_or_default(),
        is_active: None,
    };

    match state.auth_service.register(new_user, &body.password).await {
        Ok(user_id) => {
            info!("Registration successful, user_id: {}", user_id);
            Ok(HttpResponse::Created().json(RegisterResponse {
                message: "User registered successfully.",
                user_id,
            }))
        }
        Err(e) => {
            error!("Registration failed: {}", e);
            Err(e)
        }
    }
}

pub async fn login(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    admit(&state, &req).await?;

    let body: LoginRequest = parse_json(&body)?;

    info!("Received login request for email: {}", body.email);

    match state.auth_service.login(&body.email, &body.password).await {
        Ok((access_token, refresh_token)) => {
            info!("Login successful for email: {}", body.email);
            Ok(HttpResponse::Ok().json(LoginResponse {
                access_token,
                refresh_token,
                expires_in: state.config.auth.access_ttl_secs,
                token_type: "Bearer",
            }))
        }
        Err(e) => {
            warn!("Login failed for email: {}: {}", body.email, e);
            Err(e)
        }
    }
}

pub async fn refresh(
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body: RefreshRequest = parse_json(&body)?;
    if body.refresh_token.is_empty() {
        return Err(AppError::Validation("refresh_token is required".into()));
    }

    let access_token = state.auth_service.refresh(&body.refresh_token).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse {
        access_token,
        expires_in: state.config.auth.access_ttl_secs,
        token_type: "Bearer",
    }))
}

pub async fn me(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let identity = authenticate_request(&req, &state)?;

    let user = state.auth_service.get_profile(identity.user_id).await?;

    Ok(HttpResponse::Ok().json(user))
}

/// Tokens are stateless, so there is nothing to revoke server-side; the
/// client discards its copies. The endpoint still requires a valid token.
pub async fn logout(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let identity = authenticate_request(&req, &state)?;

    info!("User {} logged out", identity.user_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Logged out successfully."
    })))
}
