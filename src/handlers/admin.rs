//! Admin HTTP handlers
//!
//! Campaign management and the manual review queue. Every route here is
//! gated by the AdminUser extractor.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiResult;
use crate::middleware::AdminUser;
use crate::models::{
    ApiResponse, Campaign, CreateCampaignRequest, ListUploadsQuery, PaginatedResponse,
    PaginationParams, RejectUploadRequest, UpdateCampaignRequest, UpdateCampaignStatusRequest,
    Upload,
};
use crate::state::AppState;

// ===== Campaigns =====

/// POST /api/campaigns - Create a campaign in DRAFT
pub async fn create_campaign(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<CreateCampaignRequest>,
) -> ApiResult<Json<ApiResponse<Campaign>>> {
    req.validate()?;
    let campaign = state.campaign_service.create_campaign(req).await?;
    Ok(Json(ApiResponse::ok(campaign)))
}

/// GET /api/admin/campaigns - All campaigns regardless of status
pub async fn list_campaigns(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<PaginationParams>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<Campaign>>>> {
    let campaigns = state.campaign_service.list_all_campaigns(params).await?;
    Ok(Json(ApiResponse::ok(campaigns)))
}

/// PATCH /api/campaigns/:id - Update campaign fields
pub async fn update_campaign(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(campaign_id): Path<Uuid>,
    Json(req): Json<UpdateCampaignRequest>,
) -> ApiResult<Json<ApiResponse<Campaign>>> {
    let campaign = state.campaign_service.update_campaign(campaign_id, req).await?;
    Ok(Json(ApiResponse::ok(campaign)))
}

/// PATCH /api/campaigns/:id/status - Explicit status transition
pub async fn update_campaign_status(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(campaign_id): Path<Uuid>,
    Json(req): Json<UpdateCampaignStatusRequest>,
) -> ApiResult<Json<ApiResponse<Campaign>>> {
    let campaign = state
        .campaign_service
        .update_status(campaign_id, req.status)
        .await?;
    Ok(Json(ApiResponse::ok(campaign)))
}

// ===== Review queue =====

/// GET /api/admin/uploads - All uploads, optionally filtered by status
pub async fn list_uploads(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<ListUploadsQuery>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<Upload>>>> {
    let uploads = state.upload_service.list_uploads(query).await?;
    Ok(Json(ApiResponse::ok(uploads)))
}

/// GET /api/admin/uploads/pending - Manual review queue, oldest first
pub async fn list_pending_uploads(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<PaginationParams>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<Upload>>>> {
    let uploads = state.upload_service.list_pending(params).await?;
    Ok(Json(ApiResponse::ok(uploads)))
}

/// POST /api/admin/uploads/:id/approve - Approve and credit the contributor
pub async fn approve_upload(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(upload_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Upload>>> {
    let upload = state
        .upload_service
        .approve_upload(upload_id, Some(admin.user_id))
        .await?;
    Ok(Json(ApiResponse::ok(upload)))
}

/// POST /api/admin/uploads/:id/reject - Reject with a reason
pub async fn reject_upload(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(upload_id): Path<Uuid>,
    Json(req): Json<RejectUploadRequest>,
) -> ApiResult<Json<ApiResponse<Upload>>> {
    req.validate()?;
    let upload = state
        .upload_service
        .reject_upload(upload_id, &req.reason, Some(admin.user_id))
        .await?;
    Ok(Json(ApiResponse::ok(upload)))
}
