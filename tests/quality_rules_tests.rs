//! Tests for the automated quality rule pipeline

use chrono::Utc;
use uuid::Uuid;

use lenspool_backend::config::UploadLimits;
use lenspool_backend::models::{
    Campaign, CampaignStatus, PayoutStatus, Upload, UploadStatus, User,
};
use lenspool_backend::services::quality::run_quality_rules;

fn limits() -> UploadLimits {
    UploadLimits {
        max_file_size_mb: 50,
        min_image_width: 1920,
        min_image_height: 1080,
        max_uploads_per_day_unverified: 50,
        max_uploads_per_day_verified: 200,
    }
}

fn test_user() -> User {
    User {
        id: Uuid::new_v4(),
        email: "contributor@example.com".to_string(),
        password_hash: "hash".to_string(),
        full_name: None,
        country_code: Some("DE".to_string()),
        phone: None,
        language: None,
        is_verified: false,
        is_banned: false,
        is_admin: false,
        quality_score: 0.5,
        total_uploads: 10,
        approved_uploads: 5,
        rejected_uploads: 5,
        current_balance_cents: 0,
        total_earned_cents: 0,
        payout_method: None,
        payout_details: None,
        created_at: Utc::now(),
        last_active_at: None,
    }
}

fn test_campaign() -> Campaign {
    Campaign {
        id: Uuid::new_v4(),
        title: "Street scenes".to_string(),
        description: None,
        instructions: None,
        required_tags: vec!["street".to_string()],
        optional_tags: vec![],
        required_metadata: None,
        allowed_countries: None,
        status: CampaignStatus::Active,
        base_payout_cents: 150,
        bonus_payout_cents: None,
        max_uploads_per_user: None,
        target_quantity: None,
        total_collected: 0,
        priority: 0,
        starts_at: None,
        ends_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn test_upload(user_id: Uuid, campaign_id: Uuid) -> Upload {
    Upload {
        id: Uuid::new_v4(),
        user_id,
        campaign_id: Some(campaign_id),
        storage_path: format!("raw-uploads/{}/photo.jpg", user_id),
        original_filename: "photo.jpg".to_string(),
        mime_type: "image/jpeg".to_string(),
        file_size_bytes: 4 * 1024 * 1024,
        width: Some(4032),
        height: Some(3024),
        exif_data: Some(serde_json::json!({"make": "Canon", "iso": 100})),
        user_tags: vec!["street".to_string()],
        user_notes: None,
        status: UploadStatus::Processing,
        auto_quality_score: None,
        payout_amount_cents: None,
        payout_status: PayoutStatus::Unset,
        reviewed_by: None,
        rejection_reason: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        processed_at: None,
        reviewed_at: None,
    }
}

#[test]
fn clean_upload_passes_all_rules() {
    let user = test_user();
    let campaign = test_campaign();
    let upload = test_upload(user.id, campaign.id);

    let verdict = run_quality_rules(&upload, &user, &campaign, 3, &limits());

    assert!(verdict.passed);
    assert!(verdict.issues.is_empty());
}

#[test]
fn low_resolution_is_flagged() {
    let user = test_user();
    let campaign = test_campaign();
    let mut upload = test_upload(user.id, campaign.id);
    upload.width = Some(800);
    upload.height = Some(600);

    let verdict = run_quality_rules(&upload, &user, &campaign, 1, &limits());

    assert!(!verdict.passed);
    assert_eq!(
        verdict.issues,
        vec!["Image resolution too low. Minimum: 1920x1080".to_string()]
    );
}

#[test]
fn missing_dimensions_are_flagged() {
    let user = test_user();
    let campaign = test_campaign();
    let mut upload = test_upload(user.id, campaign.id);
    upload.width = None;
    upload.height = None;

    let verdict = run_quality_rules(&upload, &user, &campaign, 1, &limits());

    assert!(!verdict.passed);
    assert!(verdict
        .issues
        .contains(&"Image dimensions not available".to_string()));
}

#[test]
fn oversized_file_is_flagged() {
    let user = test_user();
    let campaign = test_campaign();
    let mut upload = test_upload(user.id, campaign.id);
    upload.file_size_bytes = 51 * 1024 * 1024;

    let verdict = run_quality_rules(&upload, &user, &campaign, 1, &limits());

    assert!(!verdict.passed);
    assert!(verdict
        .issues
        .contains(&"File size exceeds 50MB limit".to_string()));
}

#[test]
fn missing_exif_is_flagged() {
    let user = test_user();
    let campaign = test_campaign();
    let mut upload = test_upload(user.id, campaign.id);
    upload.exif_data = None;

    let verdict = run_quality_rules(&upload, &user, &campaign, 1, &limits());

    assert!(!verdict.passed);
    assert!(verdict
        .issues
        .contains(&"Missing EXIF metadata - image may have been edited".to_string()));
}

#[test]
fn gps_required_but_absent_is_flagged() {
    let user = test_user();
    let mut campaign = test_campaign();
    campaign.required_metadata = Some(serde_json::json!({"gps": true}));
    let upload = test_upload(user.id, campaign.id);

    let verdict = run_quality_rules(&upload, &user, &campaign, 1, &limits());

    assert!(!verdict.passed);
    assert!(verdict
        .issues
        .contains(&"GPS location required but not present".to_string()));
}

#[test]
fn gps_present_satisfies_requirement() {
    let user = test_user();
    let mut campaign = test_campaign();
    campaign.required_metadata = Some(serde_json::json!({"gps": true}));
    let mut upload = test_upload(user.id, campaign.id);
    upload.exif_data = Some(serde_json::json!({
        "gps": {"latitude": 52.52, "longitude": 13.405}
    }));

    let verdict = run_quality_rules(&upload, &user, &campaign, 1, &limits());

    assert!(verdict.passed);
}

#[test]
fn gps_not_required_when_predicate_absent() {
    let user = test_user();
    let campaign = test_campaign();
    let upload = test_upload(user.id, campaign.id);
    assert!(upload.exif_data.as_ref().unwrap().get("gps").is_none());

    let verdict = run_quality_rules(&upload, &user, &campaign, 1, &limits());

    assert!(verdict.passed);
}

#[test]
fn missing_required_tags_are_listed() {
    let user = test_user();
    let mut campaign = test_campaign();
    campaign.required_tags = vec!["street".to_string(), "night".to_string()];
    let mut upload = test_upload(user.id, campaign.id);
    upload.user_tags = vec!["daytime".to_string()];

    let verdict = run_quality_rules(&upload, &user, &campaign, 1, &limits());

    assert!(!verdict.passed);
    assert!(verdict
        .issues
        .contains(&"Missing required tags: street, night".to_string()));
}

#[test]
fn daily_cap_applies_to_unverified_users() {
    let user = test_user();
    let campaign = test_campaign();
    let upload = test_upload(user.id, campaign.id);

    // 51st upload today for an unverified account
    let verdict = run_quality_rules(&upload, &user, &campaign, 51, &limits());

    assert!(!verdict.passed);
    assert!(verdict
        .issues
        .contains(&"Daily upload limit exceeded (50)".to_string()));
}

#[test]
fn verified_users_get_the_higher_cap() {
    let mut user = test_user();
    user.is_verified = true;
    let campaign = test_campaign();
    let upload = test_upload(user.id, campaign.id);

    // Fine at 51 for a verified account
    let verdict = run_quality_rules(&upload, &user, &campaign, 51, &limits());
    assert!(verdict.passed);

    // The 201st upload crosses the verified cap
    let verdict = run_quality_rules(&upload, &user, &campaign, 201, &limits());
    assert!(!verdict.passed);
    assert!(verdict
        .issues
        .contains(&"Daily upload limit exceeded (200)".to_string()));
}

#[test]
fn issues_accumulate_across_rules() {
    let user = test_user();
    let mut campaign = test_campaign();
    campaign.required_metadata = Some(serde_json::json!({"gps": true}));
    let mut upload = test_upload(user.id, campaign.id);
    upload.width = Some(640);
    upload.height = Some(480);
    upload.exif_data = None;
    upload.user_tags = vec![];

    let verdict = run_quality_rules(&upload, &user, &campaign, 1, &limits());

    // Resolution, EXIF, GPS and tags all reported in one pass
    assert!(!verdict.passed);
    assert_eq!(verdict.issues.len(), 4);
}

#[test]
fn auto_approve_requires_trusted_history() {
    let mut user = test_user();
    user.quality_score = 0.9;
    user.approved_uploads = 51;
    let campaign = test_campaign();
    let upload = test_upload(user.id, campaign.id);

    let verdict = run_quality_rules(&upload, &user, &campaign, 1, &limits());

    assert!(verdict.passed);
    assert!(verdict.auto_approve);
}

#[test]
fn short_history_never_auto_approves() {
    let mut user = test_user();
    user.quality_score = 0.9;
    user.approved_uploads = 10;
    let campaign = test_campaign();
    let upload = test_upload(user.id, campaign.id);

    let verdict = run_quality_rules(&upload, &user, &campaign, 1, &limits());

    assert!(verdict.passed);
    assert!(!verdict.auto_approve);
}

#[test]
fn threshold_values_are_exclusive() {
    // Exactly at the thresholds does not qualify
    let mut user = test_user();
    user.quality_score = 0.85;
    user.approved_uploads = 50;
    let campaign = test_campaign();
    let upload = test_upload(user.id, campaign.id);

    let verdict = run_quality_rules(&upload, &user, &campaign, 1, &limits());

    assert!(verdict.passed);
    assert!(!verdict.auto_approve);
}

#[test]
fn failed_upload_never_auto_approves() {
    let mut user = test_user();
    user.quality_score = 0.95;
    user.approved_uploads = 500;
    let campaign = test_campaign();
    let mut upload = test_upload(user.id, campaign.id);
    upload.exif_data = None;

    let verdict = run_quality_rules(&upload, &user, &campaign, 1, &limits());

    assert!(!verdict.passed);
    assert!(!verdict.auto_approve);
}
