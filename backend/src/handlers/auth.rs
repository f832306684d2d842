//! HTTP handlers for authentication endpoints

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthTokens, LoginInput, RefreshInput, RegisterInput};
use crate::services::AuthService;
use crate::AppState;
use shared::models::User;

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<Json<User>> {
    let service = AuthService::new(state.db, &state.config);
    let user = service.register(input).await?;
    Ok(Json(user))
}

/// Log in with login and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.login(input).await?;
    Ok(Json(tokens))
}

/// Exchange a refresh token for a fresh token pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshInput>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.refresh(input).await?;
    Ok(Json(tokens))
}

/// Get details of the currently logged in user
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<User>> {
    let service = AuthService::new(state.db, &state.config);
    let user = service.me(current_user.0.user_id).await?;
    Ok(Json(user))
}
