//! Quality evaluator for LensPool
//!
//! Runs the automated rule pipeline against one upload, computes payouts
//! and recomputes contributor quality scores. The rules themselves are pure
//! functions over loaded rows so they can be tested without a database.

use chrono::{NaiveTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::UploadLimits;
use crate::error::{ApiError, ApiResult};
use crate::models::{Campaign, Upload, UploadStatus, User};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Quality score a contributor must exceed to qualify for auto-approval
pub const AUTO_APPROVE_MIN_QUALITY_SCORE: f64 = 0.85;

/// Approved-upload history a contributor must exceed to qualify for auto-approval
pub const AUTO_APPROVE_MIN_APPROVED_UPLOADS: i32 = 50;

/// Trailing window size for quality score recomputation
pub const QUALITY_SCORE_WINDOW: i64 = 100;

/// Weight of the approval rate in the combined quality score
pub const APPROVAL_RATE_WEIGHT: f64 = 0.7;

/// Weight of the automated score average in the combined quality score
pub const AUTO_SCORE_WEIGHT: f64 = 0.3;

/// Automated score assumed when no upload in the window carries one
pub const DEFAULT_AUTO_SCORE: f64 = 0.5;

// ============================================================================
// Rule Pipeline (pure)
// ============================================================================

/// Outcome of the automated rule pipeline for one upload
#[derive(Debug, Serialize, Clone)]
pub struct QualityVerdict {
    /// True when no rule raised an issue
    pub passed: bool,
    /// Every problem found, in rule order (the pipeline never short-circuits)
    pub issues: Vec<String>,
    /// Passed AND the contributor has a long trusted history
    pub auto_approve: bool,
}

/// Evaluate all quality rules for an upload.
///
/// Issues accumulate across rules so a reviewer (or the contributor) sees
/// every problem at once. `uploads_today` is the user's upload count since
/// UTC midnight, supplied by the caller.
pub fn run_quality_rules(
    upload: &Upload,
    user: &User,
    campaign: &Campaign,
    uploads_today: i64,
    limits: &UploadLimits,
) -> QualityVerdict {
    let mut issues = Vec::new();

    // 1. Image dimensions
    match (upload.width, upload.height) {
        (Some(width), Some(height)) => {
            if width < limits.min_image_width || height < limits.min_image_height {
                issues.push(format!(
                    "Image resolution too low. Minimum: {}x{}",
                    limits.min_image_width, limits.min_image_height
                ));
            }
        }
        _ => issues.push("Image dimensions not available".to_string()),
    }

    // 2. File size
    if upload.file_size_bytes > limits.max_file_size_bytes() {
        issues.push(format!(
            "File size exceeds {}MB limit",
            limits.max_file_size_mb
        ));
    }

    // 3. EXIF presence (absence is a possible tampering signal)
    if !has_metadata(upload) {
        issues.push("Missing EXIF metadata - image may have been edited".to_string());
    }

    // 4. Conditional geolocation
    if campaign_requires_gps(campaign) && !metadata_has_gps(upload) {
        issues.push("GPS location required but not present".to_string());
    }

    // 5. Required tag coverage
    let missing: Vec<&str> = campaign
        .required_tags
        .iter()
        .filter(|tag| !upload.user_tags.contains(tag))
        .map(|tag| tag.as_str())
        .collect();
    if !missing.is_empty() {
        issues.push(format!("Missing required tags: {}", missing.join(", ")));
    }

    // 6. Daily upload frequency (fraud detection)
    let daily_cap = if user.is_verified {
        limits.max_uploads_per_day_verified
    } else {
        limits.max_uploads_per_day_unverified
    };
    if uploads_today > daily_cap {
        issues.push(format!("Daily upload limit exceeded ({})", daily_cap));
    }

    let passed = issues.is_empty();
    // Auto-approval is reserved for contributors with a long track record of
    // accepted work; new accounts always route to manual review.
    let auto_approve = passed
        && user.quality_score > AUTO_APPROVE_MIN_QUALITY_SCORE
        && user.approved_uploads > AUTO_APPROVE_MIN_APPROVED_UPLOADS;

    QualityVerdict {
        passed,
        issues,
        auto_approve,
    }
}

/// Payout for an upload: base payout, plus the full bonus payout iff the
/// upload's tags intersect the campaign's optional tag set. All-or-nothing,
/// no partial bonuses.
pub fn compute_payout(user_tags: &[String], campaign: &Campaign) -> i64 {
    let mut payout = campaign.base_payout_cents;

    if let Some(bonus) = campaign.bonus_payout_cents {
        let has_optional_tag = campaign
            .optional_tags
            .iter()
            .any(|tag| user_tags.contains(tag));
        if has_optional_tag {
            payout += bonus;
        }
    }

    payout
}

/// Combine a trailing window of upload outcomes into a quality score.
///
/// Returns None for an empty window (the existing score is left untouched).
/// The result is `0.7 * approval_rate + 0.3 * avg_auto_score`, clamped to
/// [0, 1]; uploads without an automated score fall back to 0.5 collectively.
pub fn rolling_quality_score(window: &[(UploadStatus, Option<f64>)]) -> Option<f64> {
    if window.is_empty() {
        return None;
    }

    let approved = window
        .iter()
        .filter(|(status, _)| *status == UploadStatus::Approved)
        .count();
    let approval_rate = approved as f64 / window.len() as f64;

    let auto_scores: Vec<f64> = window.iter().filter_map(|(_, score)| *score).collect();
    let avg_auto_score = if auto_scores.is_empty() {
        DEFAULT_AUTO_SCORE
    } else {
        auto_scores.iter().sum::<f64>() / auto_scores.len() as f64
    };

    let score = APPROVAL_RATE_WEIGHT * approval_rate + AUTO_SCORE_WEIGHT * avg_auto_score;
    Some(score.clamp(0.0, 1.0))
}

fn has_metadata(upload: &Upload) -> bool {
    match &upload.exif_data {
        Some(serde_json::Value::Object(map)) => !map.is_empty(),
        Some(serde_json::Value::Null) | None => false,
        Some(_) => true,
    }
}

fn campaign_requires_gps(campaign: &Campaign) -> bool {
    campaign
        .required_metadata
        .as_ref()
        .and_then(|meta| meta.get("gps"))
        .and_then(|gps| gps.as_bool())
        .unwrap_or(false)
}

fn metadata_has_gps(upload: &Upload) -> bool {
    upload
        .exif_data
        .as_ref()
        .and_then(|exif| exif.get("gps"))
        .map(|gps| !gps.is_null())
        .unwrap_or(false)
}

// ============================================================================
// Service
// ============================================================================

/// Quality evaluator service
#[derive(Clone)]
pub struct QualityService {
    db_pool: PgPool,
    limits: UploadLimits,
}

impl QualityService {
    /// Create a new QualityService
    pub fn new(db_pool: PgPool, limits: UploadLimits) -> Self {
        Self { db_pool, limits }
    }

    /// Load an upload with its user and campaign and run the rule pipeline
    pub async fn check_quality(&self, upload_id: Uuid) -> ApiResult<QualityVerdict> {
        let upload: Upload = sqlx::query_as("SELECT * FROM uploads WHERE id = $1")
            .bind(upload_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Upload not found".to_string()))?;

        let user: User = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(upload.user_id)
            .fetch_one(&self.db_pool)
            .await?;

        let campaign_id = upload
            .campaign_id
            .ok_or_else(|| ApiError::Conflict("Upload has no campaign".to_string()))?;

        let campaign: Campaign = sqlx::query_as("SELECT * FROM campaigns WHERE id = $1")
            .bind(campaign_id)
            .fetch_one(&self.db_pool)
            .await?;

        let midnight = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
        let uploads_today: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM uploads WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(upload.user_id)
        .bind(midnight)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(run_quality_rules(
            &upload,
            &user,
            &campaign,
            uploads_today,
            &self.limits,
        ))
    }

    /// Compute the payout amount for an upload against its campaign
    pub async fn compute_payout(&self, upload_id: Uuid) -> ApiResult<i64> {
        let upload: Upload = sqlx::query_as("SELECT * FROM uploads WHERE id = $1")
            .bind(upload_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Upload not found".to_string()))?;

        let campaign_id = match upload.campaign_id {
            Some(id) => id,
            None => return Ok(0),
        };

        let campaign: Campaign = sqlx::query_as("SELECT * FROM campaigns WHERE id = $1")
            .bind(campaign_id)
            .fetch_one(&self.db_pool)
            .await?;

        Ok(compute_payout(&upload.user_tags, &campaign))
    }

    /// Recompute a user's rolling quality score from the trailing window
    ///
    /// Recomputed from scratch each time rather than incrementally, so the
    /// score is recency-biased and self-correcting after behavior change.
    pub async fn recompute_quality_score(&self, user_id: Uuid) -> ApiResult<()> {
        let window: Vec<(UploadStatus, Option<f64>)> = sqlx::query_as(
            r#"
            SELECT status, auto_quality_score FROM uploads
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(QUALITY_SCORE_WINDOW)
        .fetch_all(&self.db_pool)
        .await?;

        let Some(score) = rolling_quality_score(&window) else {
            return Ok(());
        };

        sqlx::query("UPDATE users SET quality_score = $2 WHERE id = $1")
            .bind(user_id)
            .bind(score)
            .execute(&self.db_pool)
            .await?;

        tracing::debug!(user_id = %user_id, score, "Quality score recomputed");

        Ok(())
    }
}
