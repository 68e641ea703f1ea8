//! Promotion lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{Page, PageRequest, ProductId, PromotionId};
use marketplace::dto::{CancellationDto, CreatePromotionDto, ExpirySummary, PromotionDto};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{AdminUser, VendorUser, parse_id};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ExtendRequest {
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct PriorityRequest {
    pub priority: u8,
}

/// POST /promotions
#[tracing::instrument(skip(state))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    VendorUser(actor): VendorUser,
    Json(req): Json<CreatePromotionDto>,
) -> Result<(StatusCode, Json<PromotionDto>), ApiError> {
    let promotion = state.promotions.create_promotion(actor, req).await?;
    Ok((StatusCode::CREATED, Json(promotion)))
}

/// GET /promotions/active: promotions visible right now.
#[tracing::instrument(skip(state))]
pub async fn active(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<PromotionDto>>, ApiError> {
    let page = PageRequest::clamped(query.page, query.limit);
    Ok(Json(state.promotions.list_active(page).await?))
}

/// POST /promotions/expire: run the expiry sweep now.
#[tracing::instrument(skip(state))]
pub async fn expire(State(state): State<Arc<AppState>>) -> Result<Json<ExpirySummary>, ApiError> {
    Ok(Json(state.promotions.expire_stale().await?))
}

/// GET /products/{id}/promotions: every promotion of a product, any status.
#[tracing::instrument(skip(state))]
pub async fn for_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PromotionDto>>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    Ok(Json(state.promotions.list_for_product(product_id).await?))
}

/// GET /promotions/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PromotionDto>, ApiError> {
    let promotion_id: PromotionId = parse_id(&id)?;
    Ok(Json(state.promotions.get_promotion(promotion_id).await?))
}

/// POST /promotions/{id}/pay: admin-only payment confirmation.
#[tracing::instrument(skip(state))]
pub async fn pay(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<PromotionDto>, ApiError> {
    let promotion_id: PromotionId = parse_id(&id)?;
    Ok(Json(state.promotions.mark_paid(admin, promotion_id).await?))
}

/// POST /promotions/{id}/cancel
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    VendorUser(actor): VendorUser,
    Path(id): Path<String>,
) -> Result<Json<CancellationDto>, ApiError> {
    let promotion_id: PromotionId = parse_id(&id)?;
    Ok(Json(
        state.promotions.cancel_promotion(actor, promotion_id).await?,
    ))
}

/// POST /promotions/{id}/extend
#[tracing::instrument(skip(state))]
pub async fn extend(
    State(state): State<Arc<AppState>>,
    VendorUser(actor): VendorUser,
    Path(id): Path<String>,
    Json(req): Json<ExtendRequest>,
) -> Result<Json<PromotionDto>, ApiError> {
    let promotion_id: PromotionId = parse_id(&id)?;
    Ok(Json(
        state
            .promotions
            .extend(actor, promotion_id, req.ends_at)
            .await?,
    ))
}

/// POST /promotions/{id}/activate
#[tracing::instrument(skip(state))]
pub async fn activate(
    State(state): State<Arc<AppState>>,
    VendorUser(actor): VendorUser,
    Path(id): Path<String>,
) -> Result<Json<PromotionDto>, ApiError> {
    let promotion_id: PromotionId = parse_id(&id)?;
    Ok(Json(state.promotions.activate(actor, promotion_id).await?))
}

/// PUT /promotions/{id}/priority
#[tracing::instrument(skip(state))]
pub async fn update_priority(
    State(state): State<Arc<AppState>>,
    VendorUser(actor): VendorUser,
    Path(id): Path<String>,
    Json(req): Json<PriorityRequest>,
) -> Result<Json<PromotionDto>, ApiError> {
    let promotion_id: PromotionId = parse_id(&id)?;
    Ok(Json(
        state
            .promotions
            .update_priority(actor, promotion_id, req.priority)
            .await?,
    ))
}
