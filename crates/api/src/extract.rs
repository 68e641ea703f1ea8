//! Request extractors shared by the route handlers.
//!
//! Callers authenticate with `Authorization: Bearer <access token>`. The
//! token is resolved through the account service, so the acting user and
//! their role always come from an issued token, never from the request.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use common::UserId;
use domain::Role;
use marketplace::TokenClaims;

use crate::AppState;
use crate::error::ApiError;

const BEARER_PREFIX: &str = "Bearer ";

/// Any authenticated user. Rejects with 401 when no valid token is sent.
#[derive(Debug, Clone, Copy)]
pub struct ActingUser(pub UserId);

/// The caller if a valid token was sent, for routes that also serve
/// anonymous requests. A present but invalid token is still rejected.
#[derive(Debug, Clone, Copy)]
pub struct OptionalUser(pub Option<UserId>);

/// An authenticated vendor. Other roles get 403.
#[derive(Debug, Clone, Copy)]
pub struct VendorUser(pub UserId);

/// An authenticated admin. Other roles get 403.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub UserId);

impl FromRequestParts<Arc<AppState>> for ActingUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = require_claims(parts, state).await?;
        Ok(ActingUser(claims.user_id))
    }
}

impl FromRequestParts<Arc<AppState>> for OptionalUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = authenticate(parts, state).await?;
        Ok(OptionalUser(claims.map(|claims| claims.user_id)))
    }
}

impl FromRequestParts<Arc<AppState>> for VendorUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = require_role(parts, state, Role::Vendor).await?;
        Ok(VendorUser(claims.user_id))
    }
}

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = require_role(parts, state, Role::Admin).await?;
        Ok(AdminUser(claims.user_id))
    }
}

/// Resolves the bearer token, if any, to its claims.
async fn authenticate(
    parts: &Parts,
    state: &AppState,
) -> Result<Option<TokenClaims>, ApiError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let token = value
        .to_str()
        .ok()
        .and_then(|raw| raw.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthenticated("Invalid authentication token format".into())
        })?;

    Ok(Some(state.accounts.authenticate_access(token).await?))
}

async fn require_claims(parts: &Parts, state: &AppState) -> Result<TokenClaims, ApiError> {
    authenticate(parts, state)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("No authentication token provided".into()))
}

async fn require_role(
    parts: &Parts,
    state: &AppState,
    role: Role,
) -> Result<TokenClaims, ApiError> {
    let claims = require_claims(parts, state).await?;
    if claims.role != role {
        tracing::warn!(
            user_id = %claims.user_id,
            role = %claims.role,
            required = %role,
            "role check failed"
        );
        return Err(ApiError::Forbidden("Insufficient permissions".into()));
    }
    Ok(claims)
}

/// Parses a UUID-backed id from a path segment.
pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = uuid::Error>,
{
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
