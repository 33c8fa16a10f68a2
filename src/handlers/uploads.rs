//! Upload HTTP handlers
//!
//! Two-step intake: initiate returns a presigned URL, complete attaches
//! metadata once the bytes are in object storage.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiResult;
use crate::middleware::AuthenticatedUser;
use crate::models::{
    ApiResponse, CompleteUploadRequest, CompleteUploadResponse, InitiateUploadRequest,
    InitiateUploadResponse, PaginatedResponse, PaginationParams, Upload,
};
use crate::state::AppState;

/// POST /api/uploads/initiate - Validate file type and issue a presigned upload URL
pub async fn initiate_upload(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<InitiateUploadRequest>,
) -> ApiResult<Json<ApiResponse<InitiateUploadResponse>>> {
    req.validate()?;
    let response = state.upload_service.initiate_upload(user.user_id, req).await?;
    Ok(Json(ApiResponse::ok(response)))
}

/// POST /api/uploads/complete - Attach metadata and enter the quality pipeline
pub async fn complete_upload(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<CompleteUploadRequest>,
) -> ApiResult<Json<ApiResponse<CompleteUploadResponse>>> {
    req.validate()?;
    let response = state.upload_service.complete_upload(user.user_id, req).await?;
    Ok(Json(ApiResponse::ok(response)))
}

/// GET /api/uploads - The caller's own uploads, newest first
pub async fn list_my_uploads(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<PaginationParams>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<Upload>>>> {
    let uploads = state.upload_service.get_user_uploads(user.user_id, params).await?;
    Ok(Json(ApiResponse::ok(uploads)))
}

/// GET /api/uploads/:id - Single upload, owner or admin only
pub async fn get_upload(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(upload_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Upload>>> {
    let upload = state
        .upload_service
        .get_upload(upload_id, user.user_id, user.is_admin)
        .await?;
    Ok(Json(ApiResponse::ok(upload)))
}
