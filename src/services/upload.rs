//! Upload lifecycle orchestrator and ledger updater
//!
//! Drives an upload through initiate -> complete -> async processing ->
//! approved/rejected, and applies approve/reject outcomes atomically to
//! user balances, the transaction ledger and quality scores.
//!
//! State machine per upload:
//! PENDING (placeholder) -> PROCESSING (complete) -> APPROVED | REJECTED
//! (auto path), or back to PENDING (queued for manual review) -> terminal
//! APPROVED | REJECTED via an explicit reviewer action. The transition
//! rules are pure functions; the service runs them against rows locked
//! with `SELECT ... FOR UPDATE`, which makes them authoritative under
//! concurrency, so a second approve/reject can never double-credit the
//! ledger.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    Campaign, CompleteUploadRequest, CompleteUploadResponse, InitiateUploadRequest,
    InitiateUploadResponse, ListUploadsQuery, PaginationParams, PaginatedResponse, Upload,
    UploadStatus,
};
use crate::services::quality::QualityService;
use crate::storage::StorageService;

/// Image content types accepted at the initiate step
pub const ACCEPTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

// ===== Transition rules (pure) =====

/// A complete may only act on the caller's own placeholder row
pub fn check_placeholder(upload: &Upload, user_id: Uuid) -> ApiResult<()> {
    if upload.user_id != user_id {
        return Err(ApiError::Forbidden(
            "Upload belongs to another user".to_string(),
        ));
    }

    // The row must still be in its placeholder state
    if upload.status != UploadStatus::Pending || upload.campaign_id.is_some() {
        return Err(ApiError::Conflict(
            "Upload has already been completed".to_string(),
        ));
    }

    Ok(())
}

/// A complete may only enter an open campaign with per-user quota remaining
pub fn check_campaign_entry(
    campaign: &Campaign,
    now: DateTime<Utc>,
    existing_count: i64,
) -> ApiResult<()> {
    if !campaign.is_open(now) {
        return Err(ApiError::CampaignInactive(
            "Campaign is not accepting uploads".to_string(),
        ));
    }

    if let Some(max_per_user) = campaign.max_uploads_per_user {
        if existing_count >= max_per_user as i64 {
            return Err(ApiError::CapExceeded(
                "Maximum uploads for this campaign reached".to_string(),
            ));
        }
    }

    Ok(())
}

/// A review transition may only fire from PENDING or PROCESSING
///
/// Terminal uploads stay terminal: re-reviewing an APPROVED upload is a
/// conflict, never a second credit.
pub fn ensure_reviewable(status: UploadStatus) -> ApiResult<()> {
    match status {
        UploadStatus::Pending | UploadStatus::Processing => Ok(()),
        UploadStatus::Approved | UploadStatus::Rejected => Err(ApiError::Conflict(
            "Upload has already been reviewed".to_string(),
        )),
    }
}

/// The first payout stamp is final
///
/// A reconciliation retry that re-runs evaluation after campaign terms
/// changed must pay the originally stamped amount, not the recomputed one.
pub fn final_payout(already_stamped: Option<i64>, computed: i64) -> i64 {
    already_stamped.unwrap_or(computed)
}

/// Upload lifecycle service
pub struct UploadService {
    db_pool: PgPool,
    storage: Arc<StorageService>,
    quality: Arc<QualityService>,
    /// Handoff to the async quality pipeline worker
    queue_tx: mpsc::Sender<Uuid>,
    upload_url_ttl_seconds: u64,
}

impl UploadService {
    /// Create a new UploadService
    pub fn new(
        db_pool: PgPool,
        storage: Arc<StorageService>,
        quality: Arc<QualityService>,
        queue_tx: mpsc::Sender<Uuid>,
        upload_url_ttl_seconds: u64,
    ) -> Self {
        Self {
            db_pool,
            storage,
            quality,
            queue_tx,
            upload_url_ttl_seconds,
        }
    }

    // ===== Lifecycle: initiate =====

    /// Step 1: validate the file type, issue a presigned upload credential
    /// and persist a placeholder row
    pub async fn initiate_upload(
        &self,
        user_id: Uuid,
        req: InitiateUploadRequest,
    ) -> ApiResult<InitiateUploadResponse> {
        if !ACCEPTED_IMAGE_TYPES.contains(&req.mime_type.as_str()) {
            return Err(ApiError::InvalidFileType(
                "Only JPEG and PNG are allowed".to_string(),
            ));
        }

        let credential = self
            .storage
            .issue_upload_credential(
                user_id,
                &req.filename,
                &req.mime_type,
                self.upload_url_ttl_seconds,
            )
            .await?;

        sqlx::query(
            r#"
            INSERT INTO uploads (
                id, user_id, storage_path, original_filename, mime_type, file_size_bytes
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(credential.upload_id)
        .bind(user_id)
        .bind(&credential.storage_path)
        .bind(&req.filename)
        .bind(&req.mime_type)
        .bind(req.file_size)
        .execute(&self.db_pool)
        .await?;

        tracing::info!(upload_id = %credential.upload_id, user_id = %user_id, "Upload initiated");

        Ok(InitiateUploadResponse {
            upload_id: credential.upload_id,
            upload_url: credential.upload_url,
            expires_at: credential.expires_at,
        })
    }

    // ===== Lifecycle: complete =====

    /// Step 2: attach metadata after the file is uploaded and hand off to
    /// the async quality pipeline
    ///
    /// Runs inside one database transaction with the placeholder row locked,
    /// so a concurrent second complete for the same upload is rejected and
    /// the per-campaign cap check cannot race completes of the same
    /// placeholder. Concurrent completes of different placeholders can still
    /// overshoot the cap by a small margin; that overshoot is accepted.
    /// Every check runs before the first write.
    pub async fn complete_upload(
        &self,
        user_id: Uuid,
        req: CompleteUploadRequest,
    ) -> ApiResult<CompleteUploadResponse> {
        let now = Utc::now();
        let mut tx = self.db_pool.begin().await?;

        let upload: Option<Upload> = sqlx::query_as("SELECT * FROM uploads WHERE id = $1 FOR UPDATE")
            .bind(req.upload_id)
            .fetch_optional(&mut *tx)
            .await?;

        let upload = upload.ok_or_else(|| ApiError::NotFound("Upload not found".to_string()))?;

        check_placeholder(&upload, user_id)?;

        let campaign: Option<Campaign> = sqlx::query_as("SELECT * FROM campaigns WHERE id = $1")
            .bind(req.campaign_id)
            .fetch_optional(&mut *tx)
            .await?;

        let campaign =
            campaign.ok_or_else(|| ApiError::NotFound("Campaign not found".to_string()))?;

        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM uploads WHERE user_id = $1 AND campaign_id = $2",
        )
        .bind(user_id)
        .bind(req.campaign_id)
        .fetch_one(&mut *tx)
        .await?;

        check_campaign_entry(&campaign, now, existing)?;

        let exif_data = merge_exif(&req);

        let updated: Upload = sqlx::query_as(
            r#"
            UPDATE uploads
            SET campaign_id = $2,
                user_tags = $3,
                user_notes = $4,
                width = $5,
                height = $6,
                exif_data = $7,
                status = 'processing',
                updated_at = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(req.upload_id)
        .bind(req.campaign_id)
        .bind(&req.user_tags)
        .bind(&req.user_notes)
        .bind(req.width)
        .bind(req.height)
        .bind(&exif_data)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE campaigns SET total_collected = total_collected + 1, updated_at = $2 WHERE id = $1",
        )
        .bind(req.campaign_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET total_uploads = total_uploads + 1 WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        // Fire-and-forget handoff: the caller's response never waits on the
        // quality pipeline. A full queue is logged and left to the
        // reconciliation sweep to requeue.
        if let Err(e) = self.queue_tx.try_send(req.upload_id) {
            tracing::error!(upload_id = %req.upload_id, error = %e, "Failed to enqueue upload for processing");
        }

        Ok(CompleteUploadResponse {
            upload: updated,
            message: "Upload received! We'll review it within 24 hours.".to_string(),
        })
    }

    // ===== Async quality pipeline =====

    /// Run the quality pipeline for one upload
    ///
    /// On a failed verdict the upload is auto-rejected with the joined issue
    /// list. On a pass the payout amount is stamped (first stamp is final,
    /// so a retried run cannot change it), then the upload is either
    /// auto-approved or flipped back to PENDING for manual review.
    pub async fn process_upload(&self, upload_id: Uuid) -> ApiResult<()> {
        let verdict = self.quality.check_quality(upload_id).await?;

        if !verdict.passed {
            self.reject_upload(upload_id, &verdict.issues.join("; "), None)
                .await?;
            tracing::info!(upload_id = %upload_id, "Upload auto-rejected by quality rules");
            return Ok(());
        }

        let computed = self.quality.compute_payout(upload_id).await?;

        let now = Utc::now();
        let mut tx = self.db_pool.begin().await?;

        let upload: Option<Upload> = sqlx::query_as("SELECT * FROM uploads WHERE id = $1 FOR UPDATE")
            .bind(upload_id)
            .fetch_optional(&mut *tx)
            .await?;

        let upload = upload.ok_or_else(|| ApiError::NotFound("Upload not found".to_string()))?;

        if upload.status != UploadStatus::Processing {
            tracing::warn!(upload_id = %upload_id, "Upload left processing state mid-pipeline; skipping");
            return Ok(());
        }

        let payout = final_payout(upload.payout_amount_cents, computed);

        sqlx::query(
            r#"
            UPDATE uploads
            SET payout_amount_cents = $2,
                processed_at = COALESCE(processed_at, $3),
                updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(upload_id)
        .bind(payout)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if verdict.auto_approve {
            self.approve_upload(upload_id, None).await?;
            tracing::info!(upload_id = %upload_id, "Upload auto-approved");
        } else {
            sqlx::query(
                "UPDATE uploads SET status = 'pending', updated_at = $2 WHERE id = $1 AND status = 'processing'",
            )
            .bind(upload_id)
            .bind(Utc::now())
            .execute(&self.db_pool)
            .await?;
            tracing::info!(upload_id = %upload_id, "Upload queued for manual review");
        }

        Ok(())
    }

    // ===== Ledger & reputation =====

    /// Approve an upload and credit the contributor
    ///
    /// `reviewer_id` None means the automated reviewer. The status
    /// transition, balance increment and ledger append happen in one
    /// database transaction against the locked row.
    pub async fn approve_upload(
        &self,
        upload_id: Uuid,
        reviewer_id: Option<Uuid>,
    ) -> ApiResult<Upload> {
        let now = Utc::now();
        let mut tx = self.db_pool.begin().await?;

        let upload: Option<Upload> = sqlx::query_as("SELECT * FROM uploads WHERE id = $1 FOR UPDATE")
            .bind(upload_id)
            .fetch_optional(&mut *tx)
            .await?;

        let upload = upload.ok_or_else(|| ApiError::NotFound("Upload not found".to_string()))?;

        // Authoritative under the row lock: a concurrent review waits here
        // and then sees the terminal status
        ensure_reviewable(upload.status)?;

        let payout = upload.payout_amount_cents.ok_or_else(|| {
            ApiError::Conflict("Upload has not finished quality processing".to_string())
        })?;

        let upload: Upload = sqlx::query_as(
            r#"
            UPDATE uploads
            SET status = 'approved',
                reviewed_by = $2,
                reviewed_at = $3,
                updated_at = $3,
                payout_status = 'pending'
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(upload_id)
        .bind(reviewer_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let new_balance: i64 = sqlx::query_scalar(
            r#"
            UPDATE users
            SET approved_uploads = approved_uploads + 1,
                total_earned_cents = total_earned_cents + $2,
                current_balance_cents = current_balance_cents + $2
            WHERE id = $1
            RETURNING current_balance_cents
            "#,
        )
        .bind(upload.user_id)
        .bind(payout)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, user_id, upload_id, tx_type, amount_cents, balance_after_cents, description
            )
            VALUES ($1, $2, $3, 'earning', $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(upload.user_id)
        .bind(upload.id)
        .bind(payout)
        .bind(new_balance)
        .bind("Earning from upload approval")
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            upload_id = %upload_id,
            user_id = %upload.user_id,
            payout_cents = payout,
            "Upload approved"
        );

        if let Err(e) = self.quality.recompute_quality_score(upload.user_id).await {
            tracing::error!(user_id = %upload.user_id, error = %e, "Quality score recompute failed");
        }

        Ok(upload)
    }

    /// Reject an upload with a reason
    ///
    /// No balance change and no ledger entry; the rejected counter and
    /// quality score still move.
    pub async fn reject_upload(
        &self,
        upload_id: Uuid,
        reason: &str,
        reviewer_id: Option<Uuid>,
    ) -> ApiResult<Upload> {
        let now = Utc::now();
        let mut tx = self.db_pool.begin().await?;

        let upload: Option<Upload> = sqlx::query_as("SELECT * FROM uploads WHERE id = $1 FOR UPDATE")
            .bind(upload_id)
            .fetch_optional(&mut *tx)
            .await?;

        let upload = upload.ok_or_else(|| ApiError::NotFound("Upload not found".to_string()))?;

        ensure_reviewable(upload.status)?;

        let upload: Upload = sqlx::query_as(
            r#"
            UPDATE uploads
            SET status = 'rejected',
                rejection_reason = $2,
                reviewed_by = $3,
                reviewed_at = $4,
                updated_at = $4,
                payout_status = 'rejected'
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(upload_id)
        .bind(reason)
        .bind(reviewer_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET rejected_uploads = rejected_uploads + 1 WHERE id = $1")
            .bind(upload.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(upload_id = %upload_id, user_id = %upload.user_id, reason, "Upload rejected");

        if let Err(e) = self.quality.recompute_quality_score(upload.user_id).await {
            tracing::error!(user_id = %upload.user_id, error = %e, "Quality score recompute failed");
        }

        Ok(upload)
    }

    // ===== Reads =====

    /// A user's own uploads, newest first
    pub async fn get_user_uploads(
        &self,
        user_id: Uuid,
        params: PaginationParams,
    ) -> ApiResult<PaginatedResponse<Upload>> {
        let (page, limit, offset) = params.resolve();

        let uploads: Vec<Upload> = sqlx::query_as(
            r#"
            SELECT * FROM uploads
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM uploads WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db_pool)
            .await?;

        Ok(PaginatedResponse::new(uploads, page, limit, total))
    }

    /// Fetch a single upload, enforcing ownership unless the requester is an admin
    pub async fn get_upload(
        &self,
        upload_id: Uuid,
        requester_id: Uuid,
        is_admin: bool,
    ) -> ApiResult<Upload> {
        let upload: Option<Upload> = sqlx::query_as("SELECT * FROM uploads WHERE id = $1")
            .bind(upload_id)
            .fetch_optional(&self.db_pool)
            .await?;

        let upload = upload.ok_or_else(|| ApiError::NotFound("Upload not found".to_string()))?;

        if !is_admin && upload.user_id != requester_id {
            return Err(ApiError::Forbidden(
                "Upload belongs to another user".to_string(),
            ));
        }

        Ok(upload)
    }

    /// Admin listing across all uploads, optionally filtered by status, newest first
    pub async fn list_uploads(&self, query: ListUploadsQuery) -> ApiResult<PaginatedResponse<Upload>> {
        let params = PaginationParams {
            page: query.page,
            limit: query.limit,
        };
        let (page, limit, offset) = params.resolve();

        let mut list_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new("SELECT * FROM uploads WHERE 1=1");
        let mut count_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new("SELECT COUNT(*) FROM uploads WHERE 1=1");

        if let Some(status) = query.status {
            list_builder.push(" AND status = ");
            list_builder.push_bind(status);
            count_builder.push(" AND status = ");
            count_builder.push_bind(status);
        }

        list_builder.push(" ORDER BY created_at DESC LIMIT ");
        list_builder.push_bind(limit);
        list_builder.push(" OFFSET ");
        list_builder.push_bind(offset);

        let uploads = list_builder
            .build_query_as::<Upload>()
            .fetch_all(&self.db_pool)
            .await?;

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.db_pool)
            .await?;

        Ok(PaginatedResponse::new(uploads, page, limit, total))
    }

    /// Uploads waiting for manual review, oldest first
    pub async fn list_pending(
        &self,
        params: PaginationParams,
    ) -> ApiResult<PaginatedResponse<Upload>> {
        let (page, limit, offset) = params.resolve();

        let uploads: Vec<Upload> = sqlx::query_as(
            r#"
            SELECT * FROM uploads
            WHERE status = 'pending' AND campaign_id IS NOT NULL
            ORDER BY created_at ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM uploads WHERE status = 'pending' AND campaign_id IS NOT NULL",
        )
        .fetch_one(&self.db_pool)
        .await?;

        Ok(PaginatedResponse::new(uploads, page, limit, total))
    }

    // ===== Reconciliation =====

    /// Requeue uploads stuck in PROCESSING longer than the threshold
    ///
    /// A pipeline that died mid-run leaves its upload in PROCESSING with no
    /// self-healing path; the reconciliation sweep feeds those rows back
    /// through the same queue.
    pub async fn requeue_stuck(&self, threshold_seconds: i64) -> ApiResult<Vec<Uuid>> {
        let cutoff = Utc::now() - Duration::seconds(threshold_seconds);

        let stuck: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM uploads WHERE status = 'processing' AND updated_at < $1",
        )
        .bind(cutoff)
        .fetch_all(&self.db_pool)
        .await?;

        let mut requeued = Vec::with_capacity(stuck.len());
        for (upload_id,) in stuck {
            match self.queue_tx.send(upload_id).await {
                Ok(()) => {
                    tracing::warn!(upload_id = %upload_id, "Requeued stuck upload");
                    requeued.push(upload_id);
                }
                Err(e) => {
                    tracing::error!(upload_id = %upload_id, error = %e, "Failed to requeue stuck upload");
                    break;
                }
            }
        }

        Ok(requeued)
    }
}

/// Merge structured location/timestamp/device fields into the EXIF blob
fn merge_exif(req: &CompleteUploadRequest) -> Option<serde_json::Value> {
    let mut exif = match &req.exif_data {
        Some(serde_json::Value::Object(map)) => map.clone(),
        _ => serde_json::Map::new(),
    };

    if let Some(gps) = &req.gps_coordinates {
        if let Ok(value) = serde_json::to_value(gps) {
            exif.insert("gps".to_string(), value);
        }
    }
    if let Some(timestamp) = &req.timestamp {
        exif.insert(
            "datetime_original".to_string(),
            serde_json::Value::String(timestamp.clone()),
        );
    }
    if let Some(device) = &req.device_info {
        exif.insert("device".to_string(), device.clone());
    }

    if exif.is_empty() {
        None
    } else {
        Some(serde_json::Value::Object(exif))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GpsCoordinates;

    fn complete_request() -> CompleteUploadRequest {
        CompleteUploadRequest {
            upload_id: Uuid::new_v4(),
            campaign_id: Uuid::new_v4(),
            user_tags: vec!["street".to_string()],
            user_notes: None,
            width: Some(1920),
            height: Some(1080),
            exif_data: None,
            gps_coordinates: None,
            timestamp: None,
            device_info: None,
        }
    }

    #[test]
    fn test_accepted_image_types() {
        assert!(ACCEPTED_IMAGE_TYPES.contains(&"image/jpeg"));
        assert!(ACCEPTED_IMAGE_TYPES.contains(&"image/png"));
        assert!(!ACCEPTED_IMAGE_TYPES.contains(&"image/gif"));
        assert!(!ACCEPTED_IMAGE_TYPES.contains(&"video/mp4"));
    }

    #[test]
    fn test_merge_exif_empty() {
        let req = complete_request();
        assert!(merge_exif(&req).is_none());
    }

    #[test]
    fn test_merge_exif_structured_fields() {
        let mut req = complete_request();
        req.exif_data = Some(serde_json::json!({"iso": 200}));
        req.gps_coordinates = Some(GpsCoordinates {
            latitude: 52.52,
            longitude: 13.405,
            accuracy: Some(5.0),
        });
        req.timestamp = Some("2024-06-01T12:00:00Z".to_string());
        req.device_info = Some(serde_json::json!({"model": "Pixel 8"}));

        let exif = merge_exif(&req).unwrap();
        assert_eq!(exif["iso"], 200);
        assert_eq!(exif["gps"]["latitude"], 52.52);
        assert_eq!(exif["datetime_original"], "2024-06-01T12:00:00Z");
        assert_eq!(exif["device"]["model"], "Pixel 8");
    }

    #[test]
    fn test_merge_exif_gps_only() {
        let mut req = complete_request();
        req.gps_coordinates = Some(GpsCoordinates {
            latitude: 0.0,
            longitude: 0.0,
            accuracy: None,
        });

        let exif = merge_exif(&req).unwrap();
        assert!(exif.get("gps").is_some());
        assert!(exif.get("datetime_original").is_none());
    }
}
