//! User profile, stats and earnings HTTP handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::error::ApiResult;
use crate::middleware::AuthenticatedUser;
use crate::models::{
    ApiResponse, EarningsSummaryResponse, PaginatedResponse, PaginationParams, PayoutMethodRequest,
    Transaction, UpdateProfileRequest, UserResponse, UserStatsResponse,
};
use crate::state::AppState;

/// GET /api/users/me - Own profile
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let profile = state.auth_service.get_profile(user.user_id).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// PATCH /api/users/me - Partial profile update
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let profile = state.auth_service.update_profile(user.user_id, req).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// PUT /api/users/me/payout-method - Set the payout destination
pub async fn set_payout_method(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<PayoutMethodRequest>,
) -> ApiResult<StatusCode> {
    req.validate()?;
    state.auth_service.set_payout_method(user.user_id, req).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users/me/stats - Upload counters and quality score
pub async fn get_stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<UserStatsResponse>>> {
    let stats = state.auth_service.get_stats(user.user_id).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// GET /api/users/me/transactions - Ledger history, newest first
pub async fn get_transactions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<PaginationParams>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<Transaction>>>> {
    let transactions = state.auth_service.get_transactions(user.user_id, params).await?;
    Ok(Json(ApiResponse::ok(transactions)))
}

/// GET /api/users/me/earnings - Balance and lifetime earnings summary
pub async fn get_earnings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<EarningsSummaryResponse>>> {
    let summary = state.auth_service.get_earnings_summary(user.user_id).await?;
    Ok(Json(ApiResponse::ok(summary)))
}
