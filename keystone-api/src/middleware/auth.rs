use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use keystone_core::user::User;
use keystone_core::RequestContext;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// User id, as a string per RFC 7519.
    pub sub: String,
    pub user_id: i64,
    pub username: String,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn for_user(user: &User, lifetime_seconds: u64) -> Self {
        let now = Utc::now();
        let lifetime = i64::try_from(lifetime_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or_else(|| Duration::days(365));
        Self {
            sub: user.id.to_string(),
            user_id: user.id,
            username: user.username.clone(),
            iat: now.timestamp() as usize,
            exp: (now + lifetime).timestamp() as usize,
        }
    }
}

pub fn issue_token(auth: &AuthConfig, user: &User) -> Result<String, AppError> {
    let claims = Claims::for_user(user, auth.expiration);
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(auth.secret.expose().as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

pub fn verify_token(auth: &AuthConfig, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.secret.expose().as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        AppError::Authentication("invalid or expired token".to_string())
    })
}

// ============================================================================
// Authentication Middleware
// ============================================================================

/// Validates `Authorization: Bearer <jwt>`, then injects the claims and tags
/// the request context with the caller's id.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Authentication("missing bearer token".to_string()))?;

    let claims = verify_token(&state.auth, token)?;

    if let Some(ctx) = req.extensions_mut().get_mut::<RequestContext>() {
        ctx.user_id = Some(claims.user_id);
    }
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
