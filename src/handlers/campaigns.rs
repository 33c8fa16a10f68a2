//! Campaign HTTP handlers
//!
//! Contributor-facing browsing endpoints. Authentication is optional here:
//! anonymous callers can browse, authenticated callers additionally get
//! their own per-campaign upload counts. Campaign creation and status
//! management live under the admin handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::middleware::OptionalUser;
use crate::models::{
    ApiResponse, Campaign, CampaignWithUserCount, ListCampaignsQuery, PaginatedResponse,
};
use crate::state::AppState;

/// GET /api/campaigns - Browse open campaigns the caller is eligible for
pub async fn list_campaigns(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Query(query): Query<ListCampaignsQuery>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<CampaignWithUserCount>>>> {
    // Country can be passed explicitly; otherwise the stored profile country
    // applies for authenticated callers
    let country = match (&query.country, &user) {
        (Some(country), _) => Some(country.clone()),
        (None, Some(user)) => {
            let profile = state.auth_service.load_auth_user(user.user_id).await?;
            profile.country_code
        }
        (None, None) => None,
    };

    let campaigns = state
        .campaign_service
        .list_open_campaigns(user.map(|u| u.user_id), country.as_deref(), &query)
        .await?;

    Ok(Json(ApiResponse::ok(campaigns)))
}

/// GET /api/campaigns/:id - Campaign detail
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Campaign>>> {
    let campaign = state.campaign_service.get_campaign(campaign_id).await?;
    Ok(Json(ApiResponse::ok(campaign)))
}
