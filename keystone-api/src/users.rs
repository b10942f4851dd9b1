use axum::{extract::State, routing::get, Extension, Json, Router};
use keystone_core::user::User;

use crate::accounts;
use crate::error::AppError;
use crate::middleware::Claims;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/profile", get(profile))
}

async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<User>, AppError> {
    let user = accounts::profile(state.users.as_ref(), claims.user_id).await?;
    Ok(Json(user))
}
