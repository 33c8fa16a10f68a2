//! Data models for the LensPool backend

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

pub mod auth;
pub use auth::*;

/// Contributor account
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub country_code: Option<String>,
    pub phone: Option<String>,
    pub language: Option<String>,
    pub is_verified: bool,
    pub is_banned: bool,
    pub is_admin: bool,
    /// Rolling trust estimate in [0, 1], recomputed by the quality pipeline
    pub quality_score: f64,
    pub total_uploads: i32,
    pub approved_uploads: i32,
    pub rejected_uploads: i32,
    pub current_balance_cents: i64,
    pub total_earned_cents: i64,
    pub payout_method: Option<String>,
    pub payout_details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub last_active_at: Option<DateTime<Utc>>,
}

/// Public view of a user (never exposes the password hash)
#[derive(Debug, Serialize, Clone)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub country_code: Option<String>,
    pub phone: Option<String>,
    pub language: Option<String>,
    pub is_verified: bool,
    pub quality_score: f64,
    pub total_uploads: i32,
    pub approved_uploads: i32,
    pub rejected_uploads: i32,
    pub current_balance_cents: i64,
    pub total_earned_cents: i64,
    pub created_at: DateTime<Utc>,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            country_code: user.country_code,
            phone: user.phone,
            language: user.language,
            is_verified: user.is_verified,
            quality_score: user.quality_score,
            total_uploads: user.total_uploads,
            approved_uploads: user.approved_uploads,
            rejected_uploads: user.rejected_uploads,
            current_balance_cents: user.current_balance_cents,
            total_earned_cents: user.total_earned_cents,
            created_at: user.created_at,
            last_active_at: user.last_active_at,
        }
    }
}

/// Campaign lifecycle status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "campaign_status", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Cancelled,
}

/// A funded request for a category of photo contributions
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Campaign {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub required_tags: Vec<String>,
    pub optional_tags: Vec<String>,
    /// Metadata predicate, e.g. {"gps": true}
    pub required_metadata: Option<serde_json::Value>,
    /// None means the campaign is global
    pub allowed_countries: Option<Vec<String>>,
    pub status: CampaignStatus,
    pub base_payout_cents: i64,
    pub bonus_payout_cents: Option<i64>,
    pub max_uploads_per_user: Option<i32>,
    pub target_quantity: Option<i32>,
    pub total_collected: i32,
    pub priority: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Whether uploads may currently be completed against this campaign
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == CampaignStatus::Active && self.ends_at.map_or(true, |ends| ends > now)
    }
}

/// Upload lifecycle status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "upload_status", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum UploadStatus {
    Pending,
    Processing,
    Approved,
    Rejected,
}

/// Payout bookkeeping status of an upload
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payout_status", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum PayoutStatus {
    Unset,
    Pending,
    Paid,
    Rejected,
}

/// One contributed file, tracked through review
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Upload {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Set at the complete step, absent on placeholder rows
    pub campaign_id: Option<Uuid>,
    pub storage_path: String,
    pub original_filename: String,
    pub mime_type: String,
    pub file_size_bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub exif_data: Option<serde_json::Value>,
    pub user_tags: Vec<String>,
    pub user_notes: Option<String>,
    pub status: UploadStatus,
    /// Independent automated quality signal where available
    pub auto_quality_score: Option<f64>,
    /// Fixed once at the moment quality evaluation completes
    pub payout_amount_cents: Option<i64>,
    pub payout_status: PayoutStatus,
    /// NULL means the automated reviewer
    pub reviewed_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Ledger entry type
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "transaction_type", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Earning,
    Withdrawal,
    Adjustment,
}

/// Immutable ledger entry. Append-only: never updated or deleted.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub upload_id: Option<Uuid>,
    pub tx_type: TransactionType,
    pub amount_cents: i64,
    /// User balance immediately after this row was applied
    pub balance_after_cents: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PaginationParams {
    /// Resolve to (page, limit, offset) with page >= 1 and limit in 1..=100
    pub fn resolve(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(20).clamp(1, 100);
        (page, limit, (page - 1) * limit)
    }
}

/// Pagination metadata reported alongside list responses
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// Paginated response
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            data,
            pagination: PaginationMeta {
                page,
                limit,
                total,
                total_pages,
            },
        }
    }
}

// ===== Campaign DTOs =====

/// Request DTO for creating a campaign (starts in DRAFT)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCampaignRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub required_tags: Vec<String>,
    pub optional_tags: Option<Vec<String>>,
    pub required_metadata: Option<serde_json::Value>,
    pub allowed_countries: Option<Vec<String>>,
    #[validate(range(min = 1))]
    pub base_payout_cents: i64,
    pub bonus_payout_cents: Option<i64>,
    pub max_uploads_per_user: Option<i32>,
    pub target_quantity: Option<i32>,
    pub priority: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Request DTO for updating campaign fields
#[derive(Debug, Deserialize)]
pub struct UpdateCampaignRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub required_tags: Option<Vec<String>>,
    pub optional_tags: Option<Vec<String>>,
    pub required_metadata: Option<serde_json::Value>,
    pub allowed_countries: Option<Vec<String>>,
    pub base_payout_cents: Option<i64>,
    pub bonus_payout_cents: Option<i64>,
    pub max_uploads_per_user: Option<i32>,
    pub target_quantity: Option<i32>,
    pub priority: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Request DTO for an explicit campaign status transition
#[derive(Debug, Deserialize)]
pub struct UpdateCampaignStatusRequest {
    pub status: CampaignStatus,
}

/// Query parameters for browsing campaigns
#[derive(Debug, Deserialize)]
pub struct ListCampaignsQuery {
    pub country: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Campaign enriched with the requesting user's upload count
///
/// The count is absent for anonymous browsing.
#[derive(Debug, Serialize)]
pub struct CampaignWithUserCount {
    #[serde(flatten)]
    pub campaign: Campaign,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_upload_count: Option<i64>,
}

// ===== Upload DTOs =====

/// Request DTO for the initiate step
#[derive(Debug, Deserialize, Validate)]
pub struct InitiateUploadRequest {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    #[validate(range(min = 1))]
    pub file_size: i64,
    #[validate(length(min = 1))]
    pub mime_type: String,
}

/// Response DTO for the initiate step
#[derive(Debug, Serialize)]
pub struct InitiateUploadResponse {
    pub upload_id: Uuid,
    pub upload_url: String,
    pub expires_at: DateTime<Utc>,
}

/// Structured GPS fix merged into the EXIF blob at complete time
#[derive(Debug, Serialize, Deserialize)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
}

/// Request DTO for the complete step
#[derive(Debug, Deserialize, Validate)]
pub struct CompleteUploadRequest {
    pub upload_id: Uuid,
    pub campaign_id: Uuid,
    #[validate(length(min = 1))]
    pub user_tags: Vec<String>,
    pub user_notes: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub exif_data: Option<serde_json::Value>,
    pub gps_coordinates: Option<GpsCoordinates>,
    pub timestamp: Option<String>,
    pub device_info: Option<serde_json::Value>,
}

/// Response DTO for the complete step
#[derive(Debug, Serialize)]
pub struct CompleteUploadResponse {
    pub upload: Upload,
    pub message: String,
}

/// Query parameters for admin upload listings
#[derive(Debug, Deserialize)]
pub struct ListUploadsQuery {
    pub status: Option<UploadStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Request DTO for rejecting an upload
#[derive(Debug, Deserialize, Validate)]
pub struct RejectUploadRequest {
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
}

// ===== User DTOs =====

/// Request DTO for profile updates
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub country_code: Option<String>,
    pub language: Option<String>,
    pub phone: Option<String>,
}

/// Request DTO for setting the payout method
#[derive(Debug, Deserialize, Validate)]
pub struct PayoutMethodRequest {
    #[validate(length(min = 1, max = 50))]
    pub method: String,
    pub details: serde_json::Value,
}

/// Contributor statistics
#[derive(Debug, Serialize)]
pub struct UserStatsResponse {
    pub total_uploads: i32,
    pub approved_uploads: i32,
    pub rejected_uploads: i32,
    pub pending_uploads: i64,
    pub total_earned_cents: i64,
    pub current_balance_cents: i64,
    pub quality_score: f64,
    pub is_verified: bool,
    /// Percentage of total uploads that were approved
    pub approval_rate: f64,
}

/// Earnings summary
#[derive(Debug, Serialize)]
pub struct EarningsSummaryResponse {
    pub total_earned_cents: i64,
    pub current_balance_cents: i64,
    /// Approved uploads whose payout has not been paid out yet
    pub pending_earnings_cents: i64,
    pub total_withdrawn_cents: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let params = PaginationParams {
            page: None,
            limit: None,
        };
        assert_eq!(params.resolve(), (1, 20, 0));
    }

    #[test]
    fn test_pagination_bounds() {
        let params = PaginationParams {
            page: Some(0),
            limit: Some(500),
        };
        assert_eq!(params.resolve(), (1, 100, 0));

        let params = PaginationParams {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(params.resolve(), (3, 10, 20));
    }

    #[test]
    fn test_paginated_response_total_pages() {
        let resp = PaginatedResponse::new(vec![1, 2, 3], 1, 20, 41);
        assert_eq!(resp.pagination.total_pages, 3);

        let resp: PaginatedResponse<i32> = PaginatedResponse::new(vec![], 1, 20, 0);
        assert_eq!(resp.pagination.total_pages, 0);
    }

    #[test]
    fn test_campaign_is_open() {
        let now = Utc::now();
        let mut campaign = Campaign {
            id: Uuid::new_v4(),
            title: "Street food".to_string(),
            description: None,
            instructions: None,
            required_tags: vec![],
            optional_tags: vec![],
            required_metadata: None,
            allowed_countries: None,
            status: CampaignStatus::Active,
            base_payout_cents: 50,
            bonus_payout_cents: None,
            max_uploads_per_user: None,
            target_quantity: None,
            total_collected: 0,
            priority: 0,
            starts_at: None,
            ends_at: None,
            created_at: now,
            updated_at: now,
        };
        assert!(campaign.is_open(now));

        campaign.ends_at = Some(now - chrono::Duration::hours(1));
        assert!(!campaign.is_open(now));

        campaign.ends_at = None;
        campaign.status = CampaignStatus::Paused;
        assert!(!campaign.is_open(now));
    }

    #[test]
    fn test_campaign_user_count_omitted_when_absent() {
        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            title: "Street food".to_string(),
            description: None,
            instructions: None,
            required_tags: vec![],
            optional_tags: vec![],
            required_metadata: None,
            allowed_countries: None,
            status: CampaignStatus::Active,
            base_payout_cents: 50,
            bonus_payout_cents: None,
            max_uploads_per_user: None,
            target_quantity: None,
            total_collected: 0,
            priority: 0,
            starts_at: None,
            ends_at: None,
            created_at: now,
            updated_at: now,
        };

        // Anonymous browsing: no per-user count in the payload
        let anonymous = serde_json::to_value(CampaignWithUserCount {
            campaign: campaign.clone(),
            user_upload_count: None,
        })
        .unwrap();
        assert!(anonymous.get("user_upload_count").is_none());
        assert_eq!(anonymous["title"], "Street food");

        let authenticated = serde_json::to_value(CampaignWithUserCount {
            campaign,
            user_upload_count: Some(4),
        })
        .unwrap();
        assert_eq!(authenticated["user_upload_count"], 4);
    }
}
