//! Campaign management
//!
//! Campaigns start in DRAFT and only accept uploads while ACTIVE and not
//! past their end time. Contributor-facing listings filter by country
//! eligibility and annotate each campaign with the caller's own upload
//! count so clients can show remaining quota.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    Campaign, CampaignStatus, CampaignWithUserCount, CreateCampaignRequest, ListCampaignsQuery,
    PaginatedResponse, PaginationParams, UpdateCampaignRequest,
};

/// Campaign management service
pub struct CampaignService {
    db_pool: PgPool,
}

impl CampaignService {
    /// Create a new CampaignService
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Create a campaign in DRAFT status
    pub async fn create_campaign(&self, req: CreateCampaignRequest) -> ApiResult<Campaign> {
        let campaign: Campaign = sqlx::query_as(
            r#"
            INSERT INTO campaigns (
                id, title, description, instructions, required_tags, optional_tags,
                required_metadata, allowed_countries, base_payout_cents, bonus_payout_cents,
                max_uploads_per_user, target_quantity, priority, starts_at, ends_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.instructions)
        .bind(&req.required_tags)
        .bind(req.optional_tags.as_deref().unwrap_or(&[]))
        .bind(&req.required_metadata)
        .bind(&req.allowed_countries)
        .bind(req.base_payout_cents)
        .bind(req.bonus_payout_cents)
        .bind(req.max_uploads_per_user)
        .bind(req.target_quantity)
        .bind(req.priority.unwrap_or(0))
        .bind(req.starts_at)
        .bind(req.ends_at)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(campaign_id = %campaign.id, title = %campaign.title, "Campaign created");

        Ok(campaign)
    }

    /// Contributor-facing listing: ACTIVE, not past end time, eligible for
    /// the caller's country, with the caller's own upload count attached
    /// when a caller is known
    ///
    /// Ordered by priority then recency. Anonymous callers see the same
    /// campaigns without per-user counts.
    pub async fn list_open_campaigns(
        &self,
        user_id: Option<Uuid>,
        country_code: Option<&str>,
        query: &ListCampaignsQuery,
    ) -> ApiResult<PaginatedResponse<CampaignWithUserCount>> {
        let params = PaginationParams {
            page: query.page,
            limit: query.limit,
        };
        let (page, limit, offset) = params.resolve();
        let now = Utc::now();

        let mut list_builder: sqlx::QueryBuilder<sqlx::Postgres> = sqlx::QueryBuilder::new(
            "SELECT * FROM campaigns WHERE status = 'active' AND (ends_at IS NULL OR ends_at > ",
        );
        list_builder.push_bind(now);
        list_builder.push(")");

        let mut count_builder: sqlx::QueryBuilder<sqlx::Postgres> = sqlx::QueryBuilder::new(
            "SELECT COUNT(*) FROM campaigns WHERE status = 'active' AND (ends_at IS NULL OR ends_at > ",
        );
        count_builder.push_bind(now);
        count_builder.push(")");

        // Global campaigns (allowed_countries NULL) are visible to everyone;
        // restricted ones only to users from a listed country
        if let Some(country) = country_code {
            for builder in [&mut list_builder, &mut count_builder] {
                builder.push(" AND (allowed_countries IS NULL OR ");
                builder.push_bind(country.to_string());
                builder.push(" = ANY(allowed_countries))");
            }
        } else {
            for builder in [&mut list_builder, &mut count_builder] {
                builder.push(" AND allowed_countries IS NULL");
            }
        }

        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            for builder in [&mut list_builder, &mut count_builder] {
                builder.push(" AND (title ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR description ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(")");
            }
        }

        list_builder.push(" ORDER BY priority DESC, created_at DESC LIMIT ");
        list_builder.push_bind(limit);
        list_builder.push(" OFFSET ");
        list_builder.push_bind(offset);

        let campaigns = list_builder
            .build_query_as::<Campaign>()
            .fetch_all(&self.db_pool)
            .await?;

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.db_pool)
            .await?;

        let mut enriched = Vec::with_capacity(campaigns.len());
        for campaign in campaigns {
            let user_upload_count = match user_id {
                Some(user_id) => Some(
                    sqlx::query_scalar::<_, i64>(
                        "SELECT COUNT(*) FROM uploads WHERE user_id = $1 AND campaign_id = $2",
                    )
                    .bind(user_id)
                    .bind(campaign.id)
                    .fetch_one(&self.db_pool)
                    .await?,
                ),
                None => None,
            };

            enriched.push(CampaignWithUserCount {
                campaign,
                user_upload_count,
            });
        }

        Ok(PaginatedResponse::new(enriched, page, limit, total))
    }

    /// Admin listing across all campaigns regardless of status, newest first
    pub async fn list_all_campaigns(
        &self,
        params: PaginationParams,
    ) -> ApiResult<PaginatedResponse<Campaign>> {
        let (page, limit, offset) = params.resolve();

        let campaigns: Vec<Campaign> = sqlx::query_as(
            "SELECT * FROM campaigns ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM campaigns")
            .fetch_one(&self.db_pool)
            .await?;

        Ok(PaginatedResponse::new(campaigns, page, limit, total))
    }

    /// Fetch a single campaign by id
    pub async fn get_campaign(&self, campaign_id: Uuid) -> ApiResult<Campaign> {
        let campaign: Option<Campaign> = sqlx::query_as("SELECT * FROM campaigns WHERE id = $1")
            .bind(campaign_id)
            .fetch_optional(&self.db_pool)
            .await?;

        campaign.ok_or_else(|| ApiError::NotFound("Campaign not found".to_string()))
    }

    /// Partial update of campaign fields
    pub async fn update_campaign(
        &self,
        campaign_id: Uuid,
        req: UpdateCampaignRequest,
    ) -> ApiResult<Campaign> {
        let campaign: Option<Campaign> = sqlx::query_as(
            r#"
            UPDATE campaigns
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                instructions = COALESCE($4, instructions),
                required_tags = COALESCE($5, required_tags),
                optional_tags = COALESCE($6, optional_tags),
                required_metadata = COALESCE($7, required_metadata),
                allowed_countries = COALESCE($8, allowed_countries),
                base_payout_cents = COALESCE($9, base_payout_cents),
                bonus_payout_cents = COALESCE($10, bonus_payout_cents),
                max_uploads_per_user = COALESCE($11, max_uploads_per_user),
                target_quantity = COALESCE($12, target_quantity),
                priority = COALESCE($13, priority),
                starts_at = COALESCE($14, starts_at),
                ends_at = COALESCE($15, ends_at),
                updated_at = $16
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(campaign_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.instructions)
        .bind(&req.required_tags)
        .bind(&req.optional_tags)
        .bind(&req.required_metadata)
        .bind(&req.allowed_countries)
        .bind(req.base_payout_cents)
        .bind(req.bonus_payout_cents)
        .bind(req.max_uploads_per_user)
        .bind(req.target_quantity)
        .bind(req.priority)
        .bind(req.starts_at)
        .bind(req.ends_at)
        .bind(Utc::now())
        .fetch_optional(&self.db_pool)
        .await?;

        campaign.ok_or_else(|| ApiError::NotFound("Campaign not found".to_string()))
    }

    /// Set the campaign status
    pub async fn update_status(
        &self,
        campaign_id: Uuid,
        status: CampaignStatus,
    ) -> ApiResult<Campaign> {
        let campaign: Option<Campaign> = sqlx::query_as(
            "UPDATE campaigns SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(campaign_id)
        .bind(status)
        .bind(Utc::now())
        .fetch_optional(&self.db_pool)
        .await?;

        let campaign =
            campaign.ok_or_else(|| ApiError::NotFound("Campaign not found".to_string()))?;

        tracing::info!(campaign_id = %campaign.id, status = ?campaign.status, "Campaign status updated");

        Ok(campaign)
    }
}
