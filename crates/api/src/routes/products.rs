//! Product catalogue endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Page, PageRequest, ProductId, VendorId};
use marketplace::dto::{
    CreateProductDto, ProductDetailsDto, ProductDto, SearchProductsDto, StockAdjustment,
    UpdateProductDto,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{ActingUser, OptionalUser, VendorUser, parse_id};

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct VendorProductsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct BrandsQuery {
    #[serde(default)]
    pub prefix: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePriceRequest {
    pub price_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct BrandsResponse {
    pub brands: Vec<String>,
}

// -- Handlers --

/// POST /vendors/{id}/products: list a product under the vendor.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    VendorUser(actor): VendorUser,
    Path(id): Path<String>,
    Json(req): Json<CreateProductDto>,
) -> Result<(StatusCode, Json<ProductDto>), ApiError> {
    let vendor_id: VendorId = parse_id(&id)?;
    let product = state.products.create_product(actor, vendor_id, req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /vendors/{id}/products: inactive products only for the owner.
#[tracing::instrument(skip(state))]
pub async fn list_for_vendor(
    State(state): State<Arc<AppState>>,
    OptionalUser(actor): OptionalUser,
    Path(id): Path<String>,
    Query(query): Query<VendorProductsQuery>,
) -> Result<Json<Page<ProductDto>>, ApiError> {
    let vendor_id: VendorId = parse_id(&id)?;
    let page = state
        .products
        .list_vendor_products(
            actor,
            vendor_id,
            query.include_inactive,
            PageRequest::clamped(query.page, query.limit),
        )
        .await?;
    Ok(Json(page))
}

/// GET /products/search
#[tracing::instrument(skip(state))]
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchProductsDto>,
) -> Result<Json<Page<ProductDto>>, ApiError> {
    Ok(Json(state.products.search_products(query).await?))
}

/// GET /products/brands?prefix=: brand autocomplete.
#[tracing::instrument(skip(state))]
pub async fn brands(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BrandsQuery>,
) -> Result<Json<BrandsResponse>, ApiError> {
    let brands = state
        .products
        .brand_suggestions(&query.prefix, query.limit)
        .await?;
    Ok(Json(BrandsResponse { brands }))
}

/// GET /products/brands/{brand}: active products whose brand contains
/// `brand`.
#[tracing::instrument(skip(state))]
pub async fn by_brand(
    State(state): State<Arc<AppState>>,
    Path(brand): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<ProductDto>>, ApiError> {
    let page = PageRequest::clamped(query.page, query.limit);
    Ok(Json(state.products.search_by_brand(&brand, page).await?))
}

/// GET /products/{id}: product with its vendor.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetailsDto>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    Ok(Json(state.products.get_product_details(product_id).await?))
}

/// PATCH /products/{id}
#[tracing::instrument(skip(state, req))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    VendorUser(actor): VendorUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductDto>,
) -> Result<Json<ProductDto>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    Ok(Json(
        state.products.update_product(actor, product_id, req).await?,
    ))
}

/// DELETE /products/{id}: deactivates the product.
#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    VendorUser(actor): VendorUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    state.products.delete_product(actor, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /products/{id}/price
#[tracing::instrument(skip(state))]
pub async fn update_price(
    State(state): State<Arc<AppState>>,
    VendorUser(actor): VendorUser,
    Path(id): Path<String>,
    Json(req): Json<UpdatePriceRequest>,
) -> Result<Json<ProductDto>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    Ok(Json(
        state
            .products
            .update_price(actor, product_id, req.price_cents)
            .await?,
    ))
}

/// POST /products/{id}/stock: `{"direction": "increase", "quantity": 5}`.
#[tracing::instrument(skip(state))]
pub async fn adjust_stock(
    State(state): State<Arc<AppState>>,
    VendorUser(actor): VendorUser,
    Path(id): Path<String>,
    Json(req): Json<StockAdjustment>,
) -> Result<Json<ProductDto>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    Ok(Json(
        state.products.adjust_stock(actor, product_id, req).await?,
    ))
}

/// POST /products/{id}/toggle
#[tracing::instrument(skip(state))]
pub async fn toggle(
    State(state): State<Arc<AppState>>,
    VendorUser(actor): VendorUser,
    Path(id): Path<String>,
) -> Result<Json<ProductDto>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    Ok(Json(state.products.toggle_status(actor, product_id).await?))
}

/// POST /products/{id}/purchase: any signed-in user.
#[tracing::instrument(skip(state))]
pub async fn purchase(
    State(state): State<Arc<AppState>>,
    ActingUser(buyer): ActingUser,
    Path(id): Path<String>,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<ProductDto>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    Ok(Json(
        state
            .products
            .purchase(buyer, product_id, req.quantity)
            .await?,
    ))
}
