//! Registration and login.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::{Principal, RegisterUser};
use serde::{Deserialize, Serialize};
use store::{Store, User};

use super::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    pub email: String,
    pub role: String,
}

fn session_for<S: Store>(state: &AppState<S>, user: &User) -> Result<AuthResponse, ApiError> {
    let token = state
        .tokens
        .issue(&Principal::from(user))
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(AuthResponse {
        token,
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role.to_string(),
    })
}

/// POST /api/auth/register
#[tracing::instrument(skip(state, form))]
pub async fn register<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(form): Json<RegisterUser>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state.accounts.register(form).await?;
    Ok(Json(session_for(&state, &user)?))
}

/// POST /api/auth/login
#[tracing::instrument(skip(state, req))]
pub async fn login<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state.accounts.login(&req.username, &req.password).await?;
    Ok(Json(session_for(&state, &user)?))
}
