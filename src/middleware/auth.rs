//! Authentication middleware
//!
//! Axum extractors for JWT verification and user extraction.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{get_user_id_from_claims, verify_token, AuthService};
use crate::error::ApiError;

/// Authenticated user extracted from a Bearer token
///
/// Verification loads the account row so banned users are rejected on
/// every request, not just at login.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized(
                        "Authorization header with Bearer token required".to_string(),
                    )
                    .into_response()
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let claims = verify_token(bearer.token(), auth_service.jwt_secret())
            .map_err(|e| ApiError::Unauthorized(e.to_string()).into_response())?;

        if claims.token_type != "access" {
            return Err(
                ApiError::Unauthorized("Expected access token".to_string()).into_response(),
            );
        }

        let user_id = get_user_id_from_claims(&claims)
            .map_err(|_| ApiError::Unauthorized("Invalid user ID in token".to_string()).into_response())?;

        // Rejects missing and banned accounts
        let user = auth_service
            .load_auth_user(user_id)
            .await
            .map_err(|e| e.into_response())?;

        Ok(AuthenticatedUser {
            user_id: user.id,
            email: user.email,
            is_admin: user.is_admin,
        })
    }
}

/// Optional authenticated user extractor
///
/// Attempts to authenticate but does not fail if no valid token is present.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AuthenticatedUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(OptionalUser(Some(user))),
            Err(_) => Ok(OptionalUser(None)),
        }
    }
}

/// Extractor requiring an administrator account
pub struct AdminUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !user.is_admin {
            return Err(ApiError::Forbidden("Admin access required".to_string()).into_response());
        }

        Ok(AdminUser(user))
    }
}
