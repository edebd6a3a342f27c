//! Auth HTTP Routes
//!
//! Account registration and login. Login issues the bearer credential that
//! upload and retrieval requests present in `Authorization`.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use serde::Serialize;

use super::errors::{auth_failure, join_failure, ApiFailure};
use super::state::AppState;
use crate::auth::{LoginRequest, RegisterRequest, User};

/// Auth routes with shared state
pub fn auth_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .with_state(state)
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: UserResponse,
}

// ==================
// Handlers
// ==================

async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiFailure> {
    let user = tokio::task::spawn_blocking(move || state.accounts.register(request))
        .await
        .map_err(join_failure)?
        .map_err(auth_failure)?;

    Ok(Json(UserResponse::from(&user)))
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiFailure> {
    let (user, issued, now) = tokio::task::spawn_blocking(move || {
        let now = state.clock.now();
        state
            .accounts
            .login(request, now)
            .map(|(user, issued)| (user, issued, now))
    })
    .await
    .map_err(join_failure)?
    .map_err(auth_failure)?;

    Ok(Json(LoginResponse {
        access_token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: (issued.expires_at - now).num_seconds(),
        user: UserResponse::from(&user),
    }))
}
