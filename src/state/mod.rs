//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::AuthService;
use crate::services::{CampaignService, UploadService};
use crate::storage::StorageService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: Arc<AuthService>,
    pub campaign_service: Arc<CampaignService>,
    pub upload_service: Arc<UploadService>,
    pub storage_service: Arc<StorageService>,
}

impl AppState {
    pub fn new(
        db_pool: PgPool,
        auth_service: Arc<AuthService>,
        campaign_service: Arc<CampaignService>,
        upload_service: Arc<UploadService>,
        storage_service: Arc<StorageService>,
    ) -> Self {
        Self {
            db_pool,
            auth_service,
            campaign_service,
            upload_service,
            storage_service,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<CampaignService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.campaign_service.clone()
    }
}

impl FromRef<AppState> for Arc<UploadService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.upload_service.clone()
    }
}

impl FromRef<AppState> for Arc<StorageService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.storage_service.clone()
    }
}
