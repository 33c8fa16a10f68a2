//! Account service
//!
//! Signup, login, token refresh and contributor account management.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    AuthTokensResponse, EarningsSummaryResponse, PaginationParams, PaginatedResponse,
    PayoutMethodRequest, SignupRequest, Transaction, UpdateProfileRequest, User, UserResponse,
    UserStatsResponse,
};

use super::jwt::{
    generate_access_token, generate_refresh_token, get_user_id_from_claims, verify_token, JwtError,
};

impl From<JwtError> for ApiError {
    fn from(e: JwtError) -> Self {
        ApiError::Unauthorized(e.to_string())
    }
}

/// Account service
#[derive(Clone)]
pub struct AuthService {
    db_pool: PgPool,
    jwt_secret: String,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_days: i64,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        db_pool: PgPool,
        jwt_secret: String,
        access_token_ttl_seconds: i64,
        refresh_token_ttl_days: i64,
    ) -> Self {
        Self {
            db_pool,
            jwt_secret,
            access_token_ttl_seconds,
            refresh_token_ttl_days,
        }
    }

    /// JWT signing secret (used by the auth extractors)
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    /// Register a new account and issue tokens
    pub async fn signup(&self, req: SignupRequest) -> ApiResult<AuthTokensResponse> {
        let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
            .bind(&req.email)
            .fetch_optional(&self.db_pool)
            .await?;

        if existing.is_some() {
            return Err(ApiError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
            .map_err(|e| ApiError::InternalError(format!("Password hashing failed: {}", e)))?;

        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, password_hash, full_name, country_code, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&req.email)
        .bind(&password_hash)
        .bind(&req.full_name)
        .bind(&req.country_code)
        .bind(&req.phone)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(user_id = %user.id, "New account registered");

        self.issue_tokens(user)
    }

    /// Verify credentials and issue tokens
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthTokensResponse> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db_pool)
            .await?;

        let user = user
            .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

        if user.is_banned {
            return Err(ApiError::Forbidden("Account has been banned".to_string()));
        }

        let valid = bcrypt::verify(password, &user.password_hash)
            .map_err(|e| ApiError::InternalError(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(ApiError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        sqlx::query("UPDATE users SET last_active_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(user.id)
            .execute(&self.db_pool)
            .await?;

        self.issue_tokens(user)
    }

    /// Exchange a refresh token for a fresh token pair
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<AuthTokensResponse> {
        let claims = verify_token(refresh_token, &self.jwt_secret)?;

        if claims.token_type != "refresh" {
            return Err(ApiError::Unauthorized("Expected refresh token".to_string()));
        }

        let user_id = get_user_id_from_claims(&claims)?;
        let user = self.load_auth_user(user_id).await?;

        self.issue_tokens(user)
    }

    /// Load a user for request authentication, rejecting missing or banned accounts
    pub async fn load_auth_user(&self, user_id: Uuid) -> ApiResult<User> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?;

        let user = user.ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

        if user.is_banned {
            return Err(ApiError::Forbidden("Account has been banned".to_string()));
        }

        Ok(user)
    }

    /// Fetch the authenticated user's profile
    pub async fn get_profile(&self, user_id: Uuid) -> ApiResult<UserResponse> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?;

        user.map(UserResponse::from)
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    /// Update profile fields
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        req: UpdateProfileRequest,
    ) -> ApiResult<UserResponse> {
        let user: User = sqlx::query_as(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                country_code = COALESCE($3, country_code),
                language = COALESCE($4, language),
                phone = COALESCE($5, phone)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&req.full_name)
        .bind(&req.country_code)
        .bind(&req.language)
        .bind(&req.phone)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(user.into())
    }

    /// Set the payout method and details
    pub async fn set_payout_method(
        &self,
        user_id: Uuid,
        req: PayoutMethodRequest,
    ) -> ApiResult<()> {
        sqlx::query("UPDATE users SET payout_method = $2, payout_details = $3 WHERE id = $1")
            .bind(user_id)
            .bind(&req.method)
            .bind(&req.details)
            .execute(&self.db_pool)
            .await?;

        Ok(())
    }

    /// Contributor statistics: counters, balance and approval rate
    pub async fn get_stats(&self, user_id: Uuid) -> ApiResult<UserStatsResponse> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?;

        let user = user.ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let pending_uploads: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM uploads WHERE user_id = $1 AND status = 'pending'",
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;

        let approval_rate = if user.total_uploads > 0 {
            (user.approved_uploads as f64 / user.total_uploads as f64) * 100.0
        } else {
            0.0
        };

        Ok(UserStatsResponse {
            total_uploads: user.total_uploads,
            approved_uploads: user.approved_uploads,
            rejected_uploads: user.rejected_uploads,
            pending_uploads,
            total_earned_cents: user.total_earned_cents,
            current_balance_cents: user.current_balance_cents,
            quality_score: user.quality_score,
            is_verified: user.is_verified,
            approval_rate,
        })
    }

    /// Ledger history, newest first
    pub async fn get_transactions(
        &self,
        user_id: Uuid,
        params: PaginationParams,
    ) -> ApiResult<PaginatedResponse<Transaction>> {
        let (page, limit, offset) = params.resolve();

        let transactions: Vec<Transaction> = sqlx::query_as(
            r#"
            SELECT * FROM transactions
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

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db_pool)
            .await?;

        Ok(PaginatedResponse::new(transactions, page, limit, total))
    }

    /// Earnings summary: lifetime totals, balance, pending and withdrawn amounts
    pub async fn get_earnings_summary(&self, user_id: Uuid) -> ApiResult<EarningsSummaryResponse> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?;

        let user = user.ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let pending_earnings: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(payout_amount_cents) FROM uploads
            WHERE user_id = $1 AND status = 'approved' AND payout_status = 'pending'
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;

        let withdrawn: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_cents) FROM transactions WHERE user_id = $1 AND tx_type = 'withdrawal'",
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(EarningsSummaryResponse {
            total_earned_cents: user.total_earned_cents,
            current_balance_cents: user.current_balance_cents,
            pending_earnings_cents: pending_earnings.unwrap_or(0),
            total_withdrawn_cents: withdrawn.unwrap_or(0).abs(),
        })
    }

    fn issue_tokens(&self, user: User) -> ApiResult<AuthTokensResponse> {
        let access_token = generate_access_token(
            user.id,
            &user.email,
            &self.jwt_secret,
            self.access_token_ttl_seconds,
        )?;

        let refresh_token = generate_refresh_token(
            user.id,
            &user.email,
            &self.jwt_secret,
            self.refresh_token_ttl_days,
        )?;

        Ok(AuthTokensResponse {
            user: user.into(),
            access_token,
            refresh_token,
        })
    }
}
