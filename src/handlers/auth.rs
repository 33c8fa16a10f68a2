//! Authentication HTTP handlers

use axum::{extract::State, Json};
use validator::Validate;

use crate::error::ApiResult;
use crate::middleware::AuthenticatedUser;
use crate::models::auth::{AuthTokensResponse, LoginRequest, RefreshTokenRequest, SignupRequest};
use crate::models::{ApiResponse, UserResponse};
use crate::state::AppState;

/// POST /auth/signup - Register a new contributor account
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<Json<ApiResponse<AuthTokensResponse>>> {
    req.validate()?;
    let tokens = state.auth_service.signup(req).await?;
    Ok(Json(ApiResponse::ok(tokens)))
}

/// POST /auth/login - Authenticate with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthTokensResponse>>> {
    let tokens = state.auth_service.login(&req.email, &req.password).await?;
    Ok(Json(ApiResponse::ok(tokens)))
}

/// POST /auth/refresh - Exchange a refresh token for fresh tokens
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> ApiResult<Json<ApiResponse<AuthTokensResponse>>> {
    let tokens = state.auth_service.refresh(&req.refresh_token).await?;
    Ok(Json(ApiResponse::ok(tokens)))
}

/// GET /auth/me - Current authenticated user
pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let profile = state.auth_service.get_profile(user.user_id).await?;
    Ok(Json(ApiResponse::ok(profile)))
}
