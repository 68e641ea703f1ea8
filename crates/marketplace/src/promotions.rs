//! Promotion use-cases and the expiry sweep.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{Page, PageRequest, ProductId, PromotionId, UserId};
use domain::{Clock, NewPromotion, Product, Promotion, PromotionStatus, ValidationError};
use store::{ProductRepository, PromotionRepository, UserRepository, VendorRepository};

use crate::dto::{CancellationDto, CreatePromotionDto, ExpirySummary, PromotionDto};
use crate::error::{AppError, Result};

#[derive(Clone)]
pub struct PromotionService {
    promotions: Arc<dyn PromotionRepository>,
    products: Arc<dyn ProductRepository>,
    vendors: Arc<dyn VendorRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl PromotionService {
    pub fn new(
        promotions: Arc<dyn PromotionRepository>,
        products: Arc<dyn ProductRepository>,
        vendors: Arc<dyn VendorRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            promotions,
            products,
            vendors,
            users,
            clock,
        }
    }

    /// Creates an unpaid promotion for an active product owned by `actor`.
    #[tracing::instrument(skip(self))]
    pub async fn create_promotion(
        &self,
        actor: UserId,
        dto: CreatePromotionDto,
    ) -> Result<PromotionDto> {
        let product = self.load_product(dto.product_id).await?;
        product.ensure_active()?;
        self.ensure_owner(actor, &product).await?;

        let now = self.clock.now();
        if dto.starts_at < now {
            return Err(ValidationError::StartInPast {
                start: dto.starts_at,
            }
            .into());
        }

        let promotion = Promotion::create(
            NewPromotion {
                product_id: dto.product_id,
                starts_at: dto.starts_at,
                ends_at: dto.ends_at,
                priority: dto.priority,
            },
            now,
        )?;
        self.promotions.save(&promotion).await?;

        metrics::counter!("promotions_created_total").increment(1);
        tracing::info!(promotion_id = %promotion.id(), product_id = %dto.product_id, "promotion created");

        Ok(PromotionDto::at(&promotion, now))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_promotion(&self, promotion_id: PromotionId) -> Result<PromotionDto> {
        let promotion = self.load(promotion_id).await?;
        Ok(PromotionDto::at(&promotion, self.clock.now()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_for_product(&self, product_id: ProductId) -> Result<Vec<PromotionDto>> {
        let now = self.clock.now();
        let promotions = self.promotions.find_by_product(product_id).await?;
        Ok(promotions
            .iter()
            .map(|promotion| PromotionDto::at(promotion, now))
            .collect())
    }

    /// Records the payment of a pending promotion. Admin only.
    ///
    /// Called on behalf of the payment collaborator once the charge has
    /// cleared.
    #[tracing::instrument(skip(self))]
    pub async fn mark_paid(
        &self,
        actor: UserId,
        promotion_id: PromotionId,
    ) -> Result<PromotionDto> {
        let admin = self
            .users
            .find_by_id(actor)
            .await?
            .ok_or_else(|| AppError::unauthorized("unknown user"))?;
        if !admin.is_admin() {
            return Err(AppError::unauthorized("only admins can record payments"));
        }

        let mut promotion = self.load(promotion_id).await?;
        let now = self.clock.now();
        promotion.mark_paid(now)?;
        self.promotions.update(&promotion).await?;

        tracing::info!(%promotion_id, admin_id = %actor, "promotion paid");
        Ok(PromotionDto::at(&promotion, now))
    }

    /// Cancels a promotion. Owner only.
    ///
    /// A paid promotion that has not started is refunded in full.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_promotion(
        &self,
        actor: UserId,
        promotion_id: PromotionId,
    ) -> Result<CancellationDto> {
        let mut promotion = self.load(promotion_id).await?;
        let product = self.load_product(promotion.product_id()).await?;
        self.ensure_owner(actor, &product).await?;

        match promotion.status() {
            PromotionStatus::Cancelled => {
                return Err(
                    ValidationError::Other("Promotion is already cancelled".into()).into(),
                );
            }
            PromotionStatus::Expired => {
                return Err(
                    ValidationError::Other("Cannot cancel an expired promotion".into()).into(),
                );
            }
            PromotionStatus::Active => {}
        }

        let cancellation = promotion.cancel(self.clock.now())?;
        self.promotions.update(&promotion).await?;

        if cancellation.refunded {
            metrics::counter!("promotions_refunded_total").increment(1);
        }
        tracing::info!(%promotion_id, refunded = cancellation.refunded, "promotion cancelled");

        Ok(cancellation.into())
    }

    /// Pushes the end date back. Owner only.
    #[tracing::instrument(skip(self))]
    pub async fn extend(
        &self,
        actor: UserId,
        promotion_id: PromotionId,
        new_end: DateTime<Utc>,
    ) -> Result<PromotionDto> {
        let mut promotion = self.load_owned(actor, promotion_id).await?;
        let now = self.clock.now();
        promotion.extend(new_end, now)?;
        self.promotions.update(&promotion).await?;

        tracing::info!(%promotion_id, %new_end, status = %promotion.status(), "promotion extended");
        Ok(PromotionDto::at(&promotion, now))
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_priority(
        &self,
        actor: UserId,
        promotion_id: PromotionId,
        priority: u8,
    ) -> Result<PromotionDto> {
        let mut promotion = self.load_owned(actor, promotion_id).await?;
        let now = self.clock.now();
        promotion.update_priority(priority, now)?;
        self.promotions.update(&promotion).await?;

        Ok(PromotionDto::at(&promotion, now))
    }

    /// Re-activates a paid promotion. Fails once its end date has passed.
    #[tracing::instrument(skip(self))]
    pub async fn activate(&self, actor: UserId, promotion_id: PromotionId) -> Result<PromotionDto> {
        let mut promotion = self.load_owned(actor, promotion_id).await?;
        let now = self.clock.now();
        promotion.activate(now)?;
        self.promotions.update(&promotion).await?;

        Ok(PromotionDto::at(&promotion, now))
    }

    /// Promotions visible right now, highest priority first.
    ///
    /// The stored page is filtered with [`Promotion::is_active_now`], so a
    /// page may hold fewer items than its limit; `total` counts the stored
    /// `Active` records.
    #[tracing::instrument(skip(self))]
    pub async fn list_active(&self, page: PageRequest) -> Result<Page<PromotionDto>> {
        let now = self.clock.now();
        let mut page = self.promotions.find_active(page).await?;
        page.items.retain(|promotion| promotion.is_active_now(now));

        Ok(page.map(|promotion| PromotionDto::at(&promotion, now)))
    }

    /// Moves every stored-`Active` promotion past its end date to `Expired`.
    ///
    /// Safe to run repeatedly: promotions already expired are not counted
    /// again.
    #[tracing::instrument(skip(self))]
    pub async fn expire_stale(&self) -> Result<ExpirySummary> {
        let now = self.clock.now();
        let candidates = self.promotions.find_by_status(PromotionStatus::Active).await?;

        let mut expired_count = 0;
        for mut promotion in candidates {
            if promotion.expire(now).transitioned() {
                self.promotions.update(&promotion).await?;
                expired_count += 1;
            }
        }

        metrics::counter!("promotions_expired_total").increment(expired_count as u64);
        if expired_count > 0 {
            tracing::info!(expired_count, "expired stale promotions");
        }

        Ok(ExpirySummary { expired_count })
    }

    async fn load(&self, promotion_id: PromotionId) -> Result<Promotion> {
        self.promotions
            .find_by_id(promotion_id)
            .await?
            .ok_or_else(|| AppError::not_found("Promotion", promotion_id))
    }

    async fn load_product(&self, product_id: ProductId) -> Result<Product> {
        self.products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Product", product_id))
    }

    async fn load_owned(&self, actor: UserId, promotion_id: PromotionId) -> Result<Promotion> {
        let promotion = self.load(promotion_id).await?;
        let product = self.load_product(promotion.product_id()).await?;
        self.ensure_owner(actor, &product).await?;
        Ok(promotion)
    }

    async fn ensure_owner(&self, actor: UserId, product: &Product) -> Result<()> {
        let vendor = self
            .vendors
            .find_by_id(product.vendor_id())
            .await?
            .ok_or_else(|| AppError::not_found("Vendor", product.vendor_id()))?;
        if !vendor.is_owned_by(actor) {
            return Err(AppError::unauthorized(
                "only the vendor owner can manage this promotion",
            ));
        }
        Ok(())
    }
}
