//! HTTP API server with observability for the beer marketplace.
//!
//! Provides REST endpoints for vendor discovery, the product catalogue,
//! promotions and accounts, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod sweeper;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use chrono::Duration;
use domain::{Clock, SystemClock};
use marketplace::{
    AccountService, Argon2PasswordHasher, InMemoryTokenIssuer, ProductService, PromotionService,
    TokenPolicy, VendorService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{
    InMemoryProductRepository, InMemoryPromotionRepository, InMemoryUserRepository,
    InMemoryVendorRepository,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
#[derive(Clone)]
pub struct AppState {
    pub vendors: VendorService,
    pub products: ProductService,
    pub promotions: PromotionService,
    pub accounts: AccountService,
}

/// Handles on the in-memory stores behind a default state.
#[derive(Clone)]
pub struct InMemoryStores {
    pub users: InMemoryUserRepository,
    pub vendors: InMemoryVendorRepository,
    pub products: InMemoryProductRepository,
    pub promotions: InMemoryPromotionRepository,
    pub tokens: InMemoryTokenIssuer,
}

impl InMemoryStores {
    /// Empty stores; issued tokens expire by `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let vendors = InMemoryVendorRepository::new();
        Self {
            users: InMemoryUserRepository::new(),
            products: InMemoryProductRepository::new(vendors.clone()),
            promotions: InMemoryPromotionRepository::new(),
            vendors,
            tokens: InMemoryTokenIssuer::new(clock),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        // Vendors
        .route("/vendors", post(routes::vendors::register))
        .route("/vendors/nearby", get(routes::vendors::nearby))
        .route("/vendors/me", get(routes::vendors::mine))
        .route(
            "/vendors/{id}",
            get(routes::vendors::get).patch(routes::vendors::update),
        )
        .route("/vendors/{id}/verify", post(routes::vendors::verify))
        .route(
            "/vendors/{id}/products",
            get(routes::products::list_for_vendor).post(routes::products::create),
        )
        // Products
        .route("/products/search", get(routes::products::search))
        .route("/products/brands", get(routes::products::brands))
        .route("/products/brands/{brand}", get(routes::products::by_brand))
        .route(
            "/products/{id}",
            get(routes::products::get)
                .patch(routes::products::update)
                .delete(routes::products::delete),
        )
        .route("/products/{id}/price", put(routes::products::update_price))
        .route("/products/{id}/stock", post(routes::products::adjust_stock))
        .route("/products/{id}/toggle", post(routes::products::toggle))
        .route("/products/{id}/purchase", post(routes::products::purchase))
        .route(
            "/products/{id}/promotions",
            get(routes::promotions::for_product),
        )
        // Promotions
        .route("/promotions", post(routes::promotions::create))
        .route("/promotions/active", get(routes::promotions::active))
        .route("/promotions/expire", post(routes::promotions::expire))
        .route("/promotions/{id}", get(routes::promotions::get))
        .route("/promotions/{id}/pay", post(routes::promotions::pay))
        .route("/promotions/{id}/cancel", post(routes::promotions::cancel))
        .route("/promotions/{id}/extend", post(routes::promotions::extend))
        .route("/promotions/{id}/activate", post(routes::promotions::activate))
        .route(
            "/promotions/{id}/priority",
            put(routes::promotions::update_priority),
        )
        // Accounts
        .route("/accounts/register", post(routes::accounts::register))
        .route("/accounts/login", post(routes::accounts::login))
        .route("/accounts/refresh", post(routes::accounts::refresh))
        .route("/accounts/verify-email", post(routes::accounts::confirm_email))
        .route(
            "/accounts/me/verification",
            post(routes::accounts::request_verification),
        )
        .route(
            "/accounts/forgot-password",
            post(routes::accounts::forgot_password),
        )
        .route(
            "/accounts/reset-password",
            post(routes::accounts::reset_password),
        )
        .route(
            "/accounts/me",
            get(routes::accounts::me).delete(routes::accounts::delete_me),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state over in-memory stores and the
/// system clock.
pub fn create_default_state(config: &Config) -> (Arc<AppState>, InMemoryStores) {
    create_state_with_clock(config, Arc::new(SystemClock))
}

/// Creates an application state over fresh in-memory stores driven by
/// `clock`.
pub fn create_state_with_clock(
    config: &Config,
    clock: Arc<dyn Clock>,
) -> (Arc<AppState>, InMemoryStores) {
    let stores = InMemoryStores::new(clock.clone());
    let access_ttl = Duration::from_std(config.token_ttl).unwrap_or(Duration::minutes(15));

    let state = Arc::new(AppState {
        vendors: VendorService::new(
            Arc::new(stores.vendors.clone()),
            Arc::new(stores.users.clone()),
            clock.clone(),
        ),
        products: ProductService::new(
            Arc::new(stores.products.clone()),
            Arc::new(stores.vendors.clone()),
            clock.clone(),
        ),
        promotions: PromotionService::new(
            Arc::new(stores.promotions.clone()),
            Arc::new(stores.products.clone()),
            Arc::new(stores.vendors.clone()),
            Arc::new(stores.users.clone()),
            clock.clone(),
        ),
        accounts: AccountService::new(
            Arc::new(stores.users.clone()),
            Arc::new(Argon2PasswordHasher::new()),
            Arc::new(stores.tokens.clone()),
            clock,
            TokenPolicy::with_access_ttl(access_ttl),
        ),
    });

    (state, stores)
}
