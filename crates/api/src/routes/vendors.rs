//! Vendor registration, profile and discovery endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Page, VendorId};
use marketplace::dto::{NearbyVendorDto, RegisterVendorDto, SearchNearbyDto, UpdateVendorDto, VendorDto};

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{ActingUser, AdminUser, VendorUser, parse_id};

/// POST /vendors: register the acting user's vendor profile.
#[tracing::instrument(skip(state, req))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    VendorUser(actor): VendorUser,
    Json(req): Json<RegisterVendorDto>,
) -> Result<(StatusCode, Json<VendorDto>), ApiError> {
    let vendor = state.vendors.register_vendor(actor, req).await?;
    Ok((StatusCode::CREATED, Json(vendor)))
}

/// GET /vendors/nearby: vendors within a radius, nearest first.
#[tracing::instrument(skip(state))]
pub async fn nearby(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchNearbyDto>,
) -> Result<Json<Page<NearbyVendorDto>>, ApiError> {
    Ok(Json(state.vendors.search_nearby(query).await?))
}

/// GET /vendors/me: the acting user's vendor profile.
#[tracing::instrument(skip(state))]
pub async fn mine(
    State(state): State<Arc<AppState>>,
    ActingUser(actor): ActingUser,
) -> Result<Json<VendorDto>, ApiError> {
    Ok(Json(state.vendors.get_vendor_by_user(actor).await?))
}

/// GET /vendors/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<VendorDto>, ApiError> {
    let vendor_id: VendorId = parse_id(&id)?;
    Ok(Json(state.vendors.get_vendor(vendor_id).await?))
}

/// PATCH /vendors/{id}: owner-only partial update.
#[tracing::instrument(skip(state, req))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    VendorUser(actor): VendorUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateVendorDto>,
) -> Result<Json<VendorDto>, ApiError> {
    let vendor_id: VendorId = parse_id(&id)?;
    Ok(Json(state.vendors.update_vendor(actor, vendor_id, req).await?))
}

/// POST /vendors/{id}/verify: admin-only verification.
#[tracing::instrument(skip(state))]
pub async fn verify(
    State(state): State<Arc<AppState>>,
    AdminUser(actor): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<VendorDto>, ApiError> {
    let vendor_id: VendorId = parse_id(&id)?;
    Ok(Json(state.vendors.verify_vendor(actor, vendor_id).await?))
}
