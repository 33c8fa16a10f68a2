//! Route definitions for the Lenspool API

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::handlers::{admin, auth, campaigns, uploads, users};
use crate::state::AppState;

// Auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/me", get(auth::me))
}

// Campaign routes (create/update are admin-gated in their handlers)
pub fn campaign_routes() -> Router<AppState> {
    Router::new()
        .route("/api/campaigns", get(campaigns::list_campaigns))
        .route("/api/campaigns", post(admin::create_campaign))
        .route("/api/campaigns/:id", get(campaigns::get_campaign))
        .route("/api/campaigns/:id", patch(admin::update_campaign))
        .route("/api/campaigns/:id/status", patch(admin::update_campaign_status))
}

// Upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/api/uploads/initiate", post(uploads::initiate_upload))
        .route("/api/uploads/complete", post(uploads::complete_upload))
        .route("/api/uploads", get(uploads::list_my_uploads))
        .route("/api/uploads/:id", get(uploads::get_upload))
}

// User routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/me", get(users::get_profile))
        .route("/api/users/me", patch(users::update_profile))
        .route("/api/users/me/payout-method", put(users::set_payout_method))
        .route("/api/users/me/stats", get(users::get_stats))
        .route("/api/users/me/transactions", get(users::get_transactions))
        .route("/api/users/me/earnings", get(users::get_earnings))
}

// Admin routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/campaigns", get(admin::list_campaigns))
        .route("/api/admin/uploads", get(admin::list_uploads))
        .route("/api/admin/uploads/pending", get(admin::list_pending_uploads))
        .route("/api/admin/uploads/:id/approve", post(admin::approve_upload))
        .route("/api/admin/uploads/:id/reject", post(admin::reject_upload))
}
