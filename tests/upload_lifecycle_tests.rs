//! State-transition guards for the upload lifecycle and payout ledger

use chrono::{Duration, Utc};
use uuid::Uuid;

use lenspool_backend::error::ApiError;
use lenspool_backend::models::{
    Campaign, CampaignStatus, PayoutStatus, Upload, UploadStatus,
};
use lenspool_backend::services::upload::{
    check_campaign_entry, check_placeholder, ensure_reviewable, final_payout,
};

fn test_upload(user_id: Uuid) -> Upload {
    let now = Utc::now();
    Upload {
        id: Uuid::new_v4(),
        user_id,
        campaign_id: None,
        storage_path: format!("uploads/{}/photo.jpg", user_id),
        original_filename: "photo.jpg".to_string(),
        mime_type: "image/jpeg".to_string(),
        file_size_bytes: 2_000_000,
        width: Some(1920),
        height: Some(1080),
        exif_data: None,
        user_tags: Vec::new(),
        user_notes: None,
        status: UploadStatus::Pending,
        auto_quality_score: None,
        payout_amount_cents: None,
        payout_status: PayoutStatus::Unset,
        reviewed_by: None,
        rejection_reason: None,
        created_at: now,
        updated_at: now,
        processed_at: None,
        reviewed_at: None,
    }
}

fn test_campaign() -> Campaign {
    let now = Utc::now();
    Campaign {
        id: Uuid::new_v4(),
        title: "Street scenes".to_string(),
        description: None,
        instructions: None,
        required_tags: vec!["street".to_string()],
        optional_tags: Vec::new(),
        required_metadata: None,
        allowed_countries: None,
        status: CampaignStatus::Active,
        base_payout_cents: 500,
        bonus_payout_cents: None,
        max_uploads_per_user: Some(10),
        target_quantity: None,
        total_collected: 0,
        priority: 0,
        starts_at: None,
        ends_at: None,
        created_at: now,
        updated_at: now,
    }
}

// ===== Review transitions =====

#[test]
fn test_pending_and_processing_are_reviewable() {
    assert!(ensure_reviewable(UploadStatus::Pending).is_ok());
    assert!(ensure_reviewable(UploadStatus::Processing).is_ok());
}

#[test]
fn test_approved_upload_cannot_be_reviewed_again() {
    // A second approve on an already-approved row must conflict instead of
    // crediting the ledger twice
    let err = ensure_reviewable(UploadStatus::Approved).unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[test]
fn test_rejected_upload_cannot_be_reviewed_again() {
    let err = ensure_reviewable(UploadStatus::Rejected).unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

// ===== Payout stamping =====

#[test]
fn test_first_payout_stamp_is_final() {
    // A retried pipeline run that recomputes a different amount (e.g. after
    // campaign terms changed) must keep the original stamp
    assert_eq!(final_payout(Some(500), 700), 500);
    assert_eq!(final_payout(Some(0), 700), 0);
}

#[test]
fn test_unstamped_upload_takes_computed_payout() {
    assert_eq!(final_payout(None, 700), 700);
}

// ===== Complete: placeholder checks =====

#[test]
fn test_complete_requires_ownership() {
    let owner = Uuid::new_v4();
    let upload = test_upload(owner);

    assert!(check_placeholder(&upload, owner).is_ok());

    let err = check_placeholder(&upload, Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));
}

#[test]
fn test_complete_rejects_already_completed_upload() {
    let owner = Uuid::new_v4();
    let mut upload = test_upload(owner);
    upload.campaign_id = Some(Uuid::new_v4());
    upload.status = UploadStatus::Processing;

    let err = check_placeholder(&upload, owner).unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[test]
fn test_complete_rejects_placeholder_with_campaign_attached() {
    // Status alone is not enough: a row back in PENDING for manual review
    // already carries its campaign and must not be completed again
    let owner = Uuid::new_v4();
    let mut upload = test_upload(owner);
    upload.campaign_id = Some(Uuid::new_v4());

    let err = check_placeholder(&upload, owner).unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

// ===== Complete: campaign checks =====

#[test]
fn test_complete_against_open_campaign() {
    let campaign = test_campaign();
    assert!(check_campaign_entry(&campaign, Utc::now(), 0).is_ok());
}

#[test]
fn test_complete_against_paused_campaign_is_rejected() {
    let mut campaign = test_campaign();
    campaign.status = CampaignStatus::Paused;

    let err = check_campaign_entry(&campaign, Utc::now(), 0).unwrap_err();
    assert!(matches!(err, ApiError::CampaignInactive(_)));
}

#[test]
fn test_complete_against_ended_campaign_is_rejected() {
    let now = Utc::now();
    let mut campaign = test_campaign();
    campaign.ends_at = Some(now - Duration::hours(1));

    let err = check_campaign_entry(&campaign, now, 0).unwrap_err();
    assert!(matches!(err, ApiError::CampaignInactive(_)));
}

#[test]
fn test_complete_over_per_user_cap_is_rejected() {
    let campaign = test_campaign();

    assert!(check_campaign_entry(&campaign, Utc::now(), 9).is_ok());

    let err = check_campaign_entry(&campaign, Utc::now(), 10).unwrap_err();
    assert!(matches!(err, ApiError::CapExceeded(_)));
}

#[test]
fn test_campaign_without_cap_accepts_any_count() {
    let mut campaign = test_campaign();
    campaign.max_uploads_per_user = None;

    assert!(check_campaign_entry(&campaign, Utc::now(), 10_000).is_ok());
}
