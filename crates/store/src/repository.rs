//! Repository contracts.
//!
//! Lookups return `Ok(None)` for a missing entity; turning that into a
//! not-found error is the caller's decision. `save` inserts and fails with
//! [`StoreError::Duplicate`](crate::StoreError::Duplicate) on a key
//! collision; `update` replaces and fails with
//! [`StoreError::NotFound`](crate::StoreError::NotFound) when absent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Page, PageRequest, ProductId, PromotionId, UserId, VendorId};
use domain::{
    EmailAddress, NearbyQuery, Product, ProductSearch, Promotion, PromotionStatus, RankedVendor,
    TaxId, User, Vendor,
};

use crate::Result;

#[async_trait]
pub trait VendorRepository: Send + Sync {
    async fn find_by_id(&self, id: VendorId) -> Result<Option<Vendor>>;

    async fn find_by_user_id(&self, user_id: UserId) -> Result<Option<Vendor>>;

    async fn find_by_tax_id(&self, tax_id: &TaxId) -> Result<Option<Vendor>>;

    /// Vendors around `query.origin()`, ranked exactly as
    /// [`domain::rank_nearby`] ranks them.
    async fn find_nearby(&self, query: &NearbyQuery) -> Result<Page<RankedVendor>>;

    /// Unique on id, tax id and owning user.
    async fn save(&self, vendor: &Vendor) -> Result<()>;

    async fn update(&self, vendor: &Vendor) -> Result<()>;

    async fn exists_by_tax_id(&self, tax_id: &TaxId) -> Result<bool> {
        Ok(self.find_by_tax_id(tax_id).await?.is_some())
    }
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>>;

    /// A vendor's products, newest first.
    async fn find_by_vendor(
        &self,
        vendor_id: VendorId,
        include_inactive: bool,
        page: PageRequest,
    ) -> Result<Page<Product>>;

    /// Products matching `search`, newest first.
    async fn search(&self, search: &ProductSearch, page: PageRequest) -> Result<Page<Product>>;

    async fn save(&self, product: &Product) -> Result<()>;

    /// Replaces the stored product if nobody wrote it since it was read.
    ///
    /// `product.version()` must match the stored version, otherwise
    /// [`StoreError::VersionConflict`](crate::StoreError::VersionConflict)
    /// is returned and nothing changes. Returns the product as stored, with
    /// its new version.
    async fn update(&self, product: &Product) -> Result<Product>;

    /// See [`domain::brand_suggestions`].
    async fn brand_suggestions(&self, prefix: &str, limit: usize) -> Result<Vec<String>>;

    /// Removes `quantity` units as one atomic step and returns the updated
    /// product.
    ///
    /// Concurrent callers can never drive stock below zero; the loser gets
    /// `StoreError::Domain(DomainError::InsufficientStock { .. })`.
    async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<Product>;

    /// Adds `quantity` units as one atomic step and returns the updated
    /// product.
    async fn increment_stock(
        &self,
        id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<Product>;
}

#[async_trait]
pub trait PromotionRepository: Send + Sync {
    async fn find_by_id(&self, id: PromotionId) -> Result<Option<Promotion>>;

    async fn find_by_status(&self, status: PromotionStatus) -> Result<Vec<Promotion>>;

    async fn find_by_product(&self, product_id: ProductId) -> Result<Vec<Promotion>>;

    /// Promotions with stored status `Active`, highest priority first, then
    /// earliest start.
    ///
    /// Stored status can be stale; callers filter with
    /// [`Promotion::is_active_now`].
    async fn find_active(&self, page: PageRequest) -> Result<Page<Promotion>>;

    async fn save(&self, promotion: &Promotion) -> Result<()>;

    async fn update(&self, promotion: &Promotion) -> Result<()>;
}

/// Soft-deleted users are invisible to every lookup.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>>;

    /// Unique on id and email, deleted users included.
    async fn save(&self, user: &User) -> Result<()>;

    async fn update(&self, user: &User) -> Result<()>;
}
