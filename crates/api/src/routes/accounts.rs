//! Account endpoints: registration, login and credential recovery.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use marketplace::dto::{
    AuthTokensDto, LoginDto, MessageDto, PasswordResetRequestedDto, RegisterUserDto,
    ResetPasswordDto, UserDto,
};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::ActingUser;

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct ConfirmEmailRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// POST /accounts/register
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterUserDto>,
) -> Result<(StatusCode, Json<AuthTokensDto>), ApiError> {
    let tokens = state.accounts.register(req).await?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

/// POST /accounts/login
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginDto>,
) -> Result<Json<AuthTokensDto>, ApiError> {
    Ok(Json(state.accounts.authenticate(req).await?))
}

/// POST /accounts/refresh
#[tracing::instrument(skip_all)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<AuthTokensDto>, ApiError> {
    Ok(Json(state.accounts.refresh(&req.refresh_token).await?))
}

/// POST /accounts/me/verification: issues an email verification token.
///
/// The token travels by email only; the reply never carries it.
#[tracing::instrument(skip(state))]
pub async fn request_verification(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    state.accounts.issue_email_verification(actor).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(MessageDto::new("Verification email sent.")),
    ))
}

/// POST /accounts/verify-email
#[tracing::instrument(skip_all)]
pub async fn confirm_email(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConfirmEmailRequest>,
) -> Result<Json<MessageDto>, ApiError> {
    Ok(Json(state.accounts.confirm_email(&req.token).await?))
}

/// POST /accounts/forgot-password: same reply whether or not the email
/// exists.
#[tracing::instrument(skip(state))]
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<(StatusCode, Json<PasswordResetRequestedDto>), ApiError> {
    let reply = state.accounts.request_password_reset(&req.email).await?;
    Ok((StatusCode::ACCEPTED, Json(reply)))
}

/// POST /accounts/reset-password
#[tracing::instrument(skip_all)]
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordDto>,
) -> Result<Json<MessageDto>, ApiError> {
    Ok(Json(state.accounts.reset_password(req).await?))
}

/// GET /accounts/me
#[tracing::instrument(skip(state))]
pub async fn me(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
) -> Result<Json<UserDto>, ApiError> {
    Ok(Json(state.accounts.get_profile(actor).await?))
}

/// DELETE /accounts/me: soft delete.
#[tracing::instrument(skip(state))]
pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
) -> Result<StatusCode, ApiError> {
    state.accounts.delete_account(actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
