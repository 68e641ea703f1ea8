use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Page, PageRequest, ProductId, VendorId};
use domain::{Product, ProductSearch, brand_suggestions};
use tokio::sync::RwLock;

use super::InMemoryVendorRepository;
use crate::{Result, StoreError, repository::ProductRepository};

/// Product store that joins on the vendor store for location filters.
#[derive(Clone)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<Vec<Product>>>,
    vendors: InMemoryVendorRepository,
}

impl InMemoryProductRepository {
    pub fn new(vendors: InMemoryVendorRepository) -> Self {
        Self {
            products: Arc::default(),
            vendors,
        }
    }

    pub async fn count(&self) -> usize {
        self.products.read().await.len()
    }
}

fn find_mut(products: &mut [Product], id: ProductId) -> Result<&mut Product> {
    products
        .iter_mut()
        .find(|p| p.id() == id)
        .ok_or_else(|| StoreError::not_found("Product", id))
}

/// Newest first; equal timestamps keep insertion order.
fn newest_first(mut products: Vec<Product>, page: PageRequest) -> Page<Product> {
    products.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    page.slice(products)
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id() == id).cloned())
    }

    async fn find_by_vendor(
        &self,
        vendor_id: VendorId,
        include_inactive: bool,
        page: PageRequest,
    ) -> Result<Page<Product>> {
        let products = self.products.read().await;
        let matching = products
            .iter()
            .filter(|p| p.vendor_id() == vendor_id && (include_inactive || p.is_active()))
            .cloned()
            .collect();
        Ok(newest_first(matching, page))
    }

    async fn search(&self, search: &ProductSearch, page: PageRequest) -> Result<Page<Product>> {
        let vendors: HashMap<VendorId, _> = if search.has_location_filter() {
            self.vendors
                .all()
                .await
                .into_iter()
                .map(|v| (v.id(), v))
                .collect()
        } else {
            HashMap::new()
        };

        let products = self.products.read().await;
        let matching = products
            .iter()
            .filter(|p| search.matches(p, vendors.get(&p.vendor_id())))
            .cloned()
            .collect();
        Ok(newest_first(matching, page))
    }

    async fn save(&self, product: &Product) -> Result<()> {
        let mut products = self.products.write().await;
        if products.iter().any(|p| p.id() == product.id()) {
            return Err(StoreError::duplicate("Product", product.id()));
        }
        products.push(product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<Product> {
        let mut products = self.products.write().await;
        let slot = find_mut(&mut products, product.id())?;
        if slot.version() != product.version() {
            return Err(StoreError::VersionConflict {
                entity: "Product",
                id: product.id().to_string(),
                expected: product.version(),
                actual: slot.version(),
            });
        }

        *slot = product.clone();
        slot.set_version(product.version() + 1);
        Ok(slot.clone())
    }

    async fn brand_suggestions(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let products = self.products.read().await;
        Ok(brand_suggestions(products.iter(), prefix, limit))
    }

    async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<Product> {
        // Check and write happen under one write lock.
        let mut products = self.products.write().await;
        let product = find_mut(&mut products, id)?;

        product.decrease_stock(quantity, now)?;
        product.set_version(product.version() + 1);
        Ok(product.clone())
    }

    async fn increment_stock(
        &self,
        id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<Product> {
        let mut products = self.products.write().await;
        let product = find_mut(&mut products, id)?;

        product.increase_stock(quantity, now)?;
        product.set_version(product.version() + 1);
        Ok(product.clone())
    }
}
