use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use keystone_core::user::User;
use serde::Serialize;

use crate::accounts::{self, LoginRequest, RegisterRequest};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::middleware::auth::issue_token;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    user: User,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let result = accounts::register(state.users.as_ref(), req).await;
    state.metrics.record_auth("register", result.is_ok());
    Ok((StatusCode::CREATED, Json(result?)))
}

async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let result = accounts::authenticate(state.users.as_ref(), &req).await;
    state.metrics.record_auth("login", result.is_ok());
    let user = result.inspect_err(|e| {
        tracing::info!(username = %req.username, reason = %e, "Login rejected")
    })?;

    let token = issue_token(&state.auth, &user)?;
    Ok(Json(LoginResponse { token, user }))
}
