use std::sync::Arc;

use async_trait::async_trait;
use common::{Page, UserId, VendorId};
use domain::{NearbyQuery, RankedVendor, TaxId, Vendor, rank_nearby};
use tokio::sync::RwLock;

use crate::{Result, StoreError, repository::VendorRepository};

#[derive(Clone, Default)]
pub struct InMemoryVendorRepository {
    vendors: Arc<RwLock<Vec<Vendor>>>,
}

impl InMemoryVendorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored vendors.
    pub async fn count(&self) -> usize {
        self.vendors.read().await.len()
    }

    /// Snapshot of every vendor, in insertion order.
    pub async fn all(&self) -> Vec<Vendor> {
        self.vendors.read().await.clone()
    }
}

#[async_trait]
impl VendorRepository for InMemoryVendorRepository {
    async fn find_by_id(&self, id: VendorId) -> Result<Option<Vendor>> {
        let vendors = self.vendors.read().await;
        Ok(vendors.iter().find(|v| v.id() == id).cloned())
    }

    async fn find_by_user_id(&self, user_id: UserId) -> Result<Option<Vendor>> {
        let vendors = self.vendors.read().await;
        Ok(vendors.iter().find(|v| v.user_id() == user_id).cloned())
    }

    async fn find_by_tax_id(&self, tax_id: &TaxId) -> Result<Option<Vendor>> {
        let vendors = self.vendors.read().await;
        Ok(vendors.iter().find(|v| v.tax_id() == tax_id).cloned())
    }

    async fn find_nearby(&self, query: &NearbyQuery) -> Result<Page<RankedVendor>> {
        let vendors = self.vendors.read().await;
        Ok(rank_nearby(vendors.iter(), query))
    }

    async fn save(&self, vendor: &Vendor) -> Result<()> {
        let mut vendors = self.vendors.write().await;

        for existing in vendors.iter() {
            if existing.id() == vendor.id() {
                return Err(StoreError::duplicate("Vendor", vendor.id()));
            }
            if existing.tax_id() == vendor.tax_id() {
                return Err(StoreError::duplicate("Vendor", vendor.tax_id()));
            }
            if existing.user_id() == vendor.user_id() {
                return Err(StoreError::duplicate("Vendor", vendor.user_id()));
            }
        }

        vendors.push(vendor.clone());
        Ok(())
    }

    async fn update(&self, vendor: &Vendor) -> Result<()> {
        let mut vendors = self.vendors.write().await;
        let slot = vendors
            .iter_mut()
            .find(|v| v.id() == vendor.id())
            .ok_or_else(|| StoreError::not_found("Vendor", vendor.id()))?;
        *slot = vendor.clone();
        Ok(())
    }
}
