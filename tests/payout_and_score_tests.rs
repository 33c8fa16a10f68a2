//! Tests for payout computation and the rolling quality score

use chrono::Utc;
use uuid::Uuid;

use lenspool_backend::models::{Campaign, CampaignStatus, UploadStatus};
use lenspool_backend::services::quality::{compute_payout, rolling_quality_score};

fn campaign_with_payouts(base: i64, bonus: Option<i64>) -> Campaign {
    Campaign {
        id: Uuid::new_v4(),
        title: "Night markets".to_string(),
        description: None,
        instructions: None,
        required_tags: vec!["market".to_string()],
        optional_tags: vec!["night".to_string(), "crowd".to_string()],
        required_metadata: None,
        allowed_countries: None,
        status: CampaignStatus::Active,
        base_payout_cents: base,
        bonus_payout_cents: bonus,
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

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

// ===== Payout =====

#[test]
fn base_payout_without_optional_tags() {
    let campaign = campaign_with_payouts(150, Some(50));
    assert_eq!(compute_payout(&tags(&["market"]), &campaign), 150);
}

#[test]
fn bonus_is_all_or_nothing() {
    let campaign = campaign_with_payouts(150, Some(50));

    // One optional tag earns the full bonus
    assert_eq!(compute_payout(&tags(&["market", "night"]), &campaign), 200);

    // Two optional tags earn the same bonus, not double
    assert_eq!(
        compute_payout(&tags(&["market", "night", "crowd"]), &campaign),
        200
    );
}

#[test]
fn no_bonus_configured_means_base_only() {
    let campaign = campaign_with_payouts(150, None);
    assert_eq!(compute_payout(&tags(&["market", "night"]), &campaign), 150);
}

#[test]
fn empty_user_tags_earn_base_only() {
    let campaign = campaign_with_payouts(150, Some(50));
    assert_eq!(compute_payout(&[], &campaign), 150);
}

// ===== Rolling quality score =====

#[test]
fn empty_window_leaves_score_untouched() {
    assert_eq!(rolling_quality_score(&[]), None);
}

#[test]
fn all_approved_with_high_auto_scores() {
    let window = vec![
        (UploadStatus::Approved, Some(1.0)),
        (UploadStatus::Approved, Some(1.0)),
        (UploadStatus::Approved, Some(1.0)),
    ];
    let score = rolling_quality_score(&window).unwrap();
    assert!((score - 1.0).abs() < 1e-9);
}

#[test]
fn weights_combine_approval_rate_and_auto_score() {
    // 50% approval, auto scores average 0.8: 0.7*0.5 + 0.3*0.8 = 0.59
    let window = vec![
        (UploadStatus::Approved, Some(0.8)),
        (UploadStatus::Rejected, Some(0.8)),
    ];
    let score = rolling_quality_score(&window).unwrap();
    assert!((score - 0.59).abs() < 1e-9);
}

#[test]
fn missing_auto_scores_fall_back_to_default() {
    // All approved, no auto scores: 0.7*1.0 + 0.3*0.5 = 0.85
    let window = vec![
        (UploadStatus::Approved, None),
        (UploadStatus::Approved, None),
    ];
    let score = rolling_quality_score(&window).unwrap();
    assert!((score - 0.85).abs() < 1e-9);
}

#[test]
fn pending_uploads_count_against_approval_rate() {
    // 1 approved of 4 total: 0.7*0.25 + 0.3*0.5 = 0.325
    let window = vec![
        (UploadStatus::Approved, None),
        (UploadStatus::Pending, None),
        (UploadStatus::Processing, None),
        (UploadStatus::Rejected, None),
    ];
    let score = rolling_quality_score(&window).unwrap();
    assert!((score - 0.325).abs() < 1e-9);
}

#[test]
fn score_stays_within_unit_interval() {
    let window = vec![(UploadStatus::Approved, Some(5.0))];
    let score = rolling_quality_score(&window).unwrap();
    assert!(score <= 1.0);

    let window = vec![(UploadStatus::Rejected, Some(-5.0))];
    let score = rolling_quality_score(&window).unwrap();
    assert!(score >= 0.0);
}

#[test]
fn all_rejected_scores_low_but_not_negative() {
    let window = vec![
        (UploadStatus::Rejected, Some(0.0)),
        (UploadStatus::Rejected, Some(0.0)),
    ];
    let score = rolling_quality_score(&window).unwrap();
    assert!((score - 0.0).abs() < 1e-9);
}
