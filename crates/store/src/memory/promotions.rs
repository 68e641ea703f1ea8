use std::sync::Arc;

use async_trait::async_trait;
use common::{Page, PageRequest, ProductId, PromotionId};
use domain::{Promotion, PromotionStatus};
use tokio::sync::RwLock;

use crate::{Result, StoreError, repository::PromotionRepository};

#[derive(Clone, Default)]
pub struct InMemoryPromotionRepository {
    promotions: Arc<RwLock<Vec<Promotion>>>,
}

impl InMemoryPromotionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.promotions.read().await.len()
    }
}

#[async_trait]
impl PromotionRepository for InMemoryPromotionRepository {
    async fn find_by_id(&self, id: PromotionId) -> Result<Option<Promotion>> {
        let promotions = self.promotions.read().await;
        Ok(promotions.iter().find(|p| p.id() == id).cloned())
    }

    async fn find_by_status(&self, status: PromotionStatus) -> Result<Vec<Promotion>> {
        let promotions = self.promotions.read().await;
        Ok(promotions
            .iter()
            .filter(|p| p.status() == status)
            .cloned()
            .collect())
    }

    async fn find_by_product(&self, product_id: ProductId) -> Result<Vec<Promotion>> {
        let promotions = self.promotions.read().await;
        Ok(promotions
            .iter()
            .filter(|p| p.product_id() == product_id)
            .cloned()
            .collect())
    }

    async fn find_active(&self, page: PageRequest) -> Result<Page<Promotion>> {
        let mut active = self.find_by_status(PromotionStatus::Active).await?;
        active.sort_by(|a, b| {
            b.priority()
                .cmp(&a.priority())
                .then_with(|| a.starts_at().cmp(&b.starts_at()))
        });
        Ok(page.slice(active))
    }

    async fn save(&self, promotion: &Promotion) -> Result<()> {
        let mut promotions = self.promotions.write().await;
        if promotions.iter().any(|p| p.id() == promotion.id()) {
            return Err(StoreError::duplicate("Promotion", promotion.id()));
        }
        promotions.push(promotion.clone());
        Ok(())
    }

    async fn update(&self, promotion: &Promotion) -> Result<()> {
        let mut promotions = self.promotions.write().await;
        let slot = promotions
            .iter_mut()
            .find(|p| p.id() == promotion.id())
            .ok_or_else(|| StoreError::not_found("Promotion", promotion.id()))?;
        *slot = promotion.clone();
        Ok(())
    }
}
