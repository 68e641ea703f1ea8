//! Product catalogue use-cases.

use std::sync::Arc;

use common::{Page, PageRequest, ProductId, UserId, VendorId};
use domain::{Clock, Money, NewProduct, Product, ProductSearch, Vendor, Volume};
use store::{ProductRepository, VendorRepository};

use crate::dto::{
    CreateProductDto, ProductDetailsDto, ProductDto, SearchProductsDto, StockAdjustment,
    UpdateProductDto,
};
use crate::error::{AppError, Result};

/// Shortest prefix that yields brand suggestions.
pub const MIN_SUGGESTION_PREFIX: usize = 2;
pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;
pub const MAX_SUGGESTION_LIMIT: usize = 20;

#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductRepository>,
    vendors: Arc<dyn VendorRepository>,
    clock: Arc<dyn Clock>,
}

impl ProductService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        vendors: Arc<dyn VendorRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            products,
            vendors,
            clock,
        }
    }

    /// Lists a new product under a verified vendor owned by `actor`.
    #[tracing::instrument(skip(self, dto), fields(brand = %dto.brand))]
    pub async fn create_product(
        &self,
        actor: UserId,
        vendor_id: VendorId,
        dto: CreateProductDto,
    ) -> Result<ProductDto> {
        let vendor = self.load_vendor(vendor_id).await?;
        if !vendor.is_owned_by(actor) {
            return Err(AppError::unauthorized(
                "only the vendor owner can add products",
            ));
        }
        vendor.ensure_verified()?;

        let product = Product::create(
            NewProduct {
                vendor_id,
                brand: dto.brand,
                volume: Volume::from_ml(dto.volume_ml)?,
                price: Money::from_cents(dto.price_cents),
                stock: dto.stock,
                description: dto.description,
                image_url: dto.image_url,
            },
            self.clock.now(),
        )?;
        self.products.save(&product).await?;

        tracing::info!(product_id = %product.id(), %vendor_id, "product created");
        Ok(ProductDto::from(&product))
    }

    /// A product with its vendor.
    #[tracing::instrument(skip(self))]
    pub async fn get_product_details(&self, product_id: ProductId) -> Result<ProductDetailsDto> {
        let product = self.load(product_id).await?;
        let vendor = self.load_vendor(product.vendor_id()).await?;
        Ok(ProductDetailsDto {
            product: ProductDto::from(&product),
            vendor: (&vendor).into(),
        })
    }

    /// A vendor's catalogue. Inactive products are listed only to the owner.
    #[tracing::instrument(skip(self))]
    pub async fn list_vendor_products(
        &self,
        actor: Option<UserId>,
        vendor_id: VendorId,
        include_inactive: bool,
        page: PageRequest,
    ) -> Result<Page<ProductDto>> {
        let vendor = self.load_vendor(vendor_id).await?;
        let include_inactive =
            include_inactive && actor.is_some_and(|actor| vendor.is_owned_by(actor));

        let page = self
            .products
            .find_by_vendor(vendor_id, include_inactive, page)
            .await?;
        Ok(page.map(|product| ProductDto::from(&product)))
    }

    /// Active products matching every given filter, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn search_products(&self, dto: SearchProductsDto) -> Result<Page<ProductDto>> {
        let search = ProductSearch {
            brand: dto.brand.filter(|brand| !brand.trim().is_empty()),
            min_price: dto.min_price_cents.map(Money::from_cents),
            max_price: dto.max_price_cents.map(Money::from_cents),
            volume: dto.volume_ml.map(Volume::from_ml).transpose()?,
            vendor_id: None,
            state: dto.state,
            city: dto.city,
            include_inactive: false,
        };
        search.validate()?;

        let page = self
            .products
            .search(&search, PageRequest::clamped(dto.page, dto.limit))
            .await?;
        tracing::debug!(total = page.total, "product search");

        Ok(page.map(|product| ProductDto::from(&product)))
    }

    /// Case-insensitive brand substring search over active products.
    #[tracing::instrument(skip(self))]
    pub async fn search_by_brand(&self, brand: &str, page: PageRequest) -> Result<Page<ProductDto>> {
        let page = self
            .products
            .search(&ProductSearch::by_brand(brand), page)
            .await?;
        Ok(page.map(|product| ProductDto::from(&product)))
    }

    /// Distinct brands starting with `prefix`, for autocomplete.
    #[tracing::instrument(skip(self))]
    pub async fn brand_suggestions(&self, prefix: &str, limit: Option<usize>) -> Result<Vec<String>> {
        if prefix.trim().chars().count() < MIN_SUGGESTION_PREFIX {
            return Ok(Vec::new());
        }
        let limit = limit
            .unwrap_or(DEFAULT_SUGGESTION_LIMIT)
            .clamp(1, MAX_SUGGESTION_LIMIT);

        Ok(self.products.brand_suggestions(prefix, limit).await?)
    }

    /// Applies a partial update. Owner only.
    ///
    /// A stock target is reached through increase or decrease, never by
    /// overwriting the count. The write is version-checked: if a purchase
    /// lands after the read, the update fails with a conflict instead of
    /// restoring the sold units.
    #[tracing::instrument(skip(self, dto))]
    pub async fn update_product(
        &self,
        actor: UserId,
        product_id: ProductId,
        dto: UpdateProductDto,
    ) -> Result<ProductDto> {
        let mut product = self.load_owned(actor, product_id).await?;
        let now = self.clock.now();

        if let Some(brand) = dto.brand.as_deref() {
            product.rename_brand(brand, now)?;
        }
        if let Some(volume_ml) = dto.volume_ml {
            product.change_volume(Volume::from_ml(volume_ml)?, now);
        }
        if let Some(price_cents) = dto.price_cents {
            product.update_price(Money::from_cents(price_cents), now)?;
        }
        if let Some(target) = dto.stock {
            let current = product.stock();
            if target > current {
                product.increase_stock(target - current, now)?;
            } else if target < current {
                product.decrease_stock(current - target, now)?;
            }
        }
        if let Some(description) = dto.description {
            product.update_description(Some(description), now);
        }
        if let Some(image_url) = dto.image_url {
            product.update_image(Some(image_url), now);
        }

        let product = self.products.update(&product).await?;
        tracing::info!(product_id = %product.id(), "product updated");

        Ok(ProductDto::from(&product))
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_price(
        &self,
        actor: UserId,
        product_id: ProductId,
        price_cents: i64,
    ) -> Result<ProductDto> {
        let mut product = self.load_owned(actor, product_id).await?;
        product.update_price(Money::from_cents(price_cents), self.clock.now())?;
        let product = self.products.update(&product).await?;

        tracing::info!(product_id = %product.id(), price = %product.price(), "price updated");
        Ok(ProductDto::from(&product))
    }

    /// Adds or removes units. Owner only. Applied atomically in the store,
    /// so concurrent purchases are never lost.
    #[tracing::instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        actor: UserId,
        product_id: ProductId,
        adjustment: StockAdjustment,
    ) -> Result<ProductDto> {
        self.load_owned(actor, product_id).await?;
        let now = self.clock.now();
        let product = match adjustment {
            StockAdjustment::Increase(quantity) => {
                self.products.increment_stock(product_id, quantity, now).await?
            }
            StockAdjustment::Decrease(quantity) => {
                self.products.decrement_stock(product_id, quantity, now).await?
            }
        };

        tracing::info!(product_id = %product.id(), stock = product.stock(), "stock adjusted");
        Ok(ProductDto::from(&product))
    }

    /// Takes `quantity` units off an active product.
    ///
    /// The decrement happens inside the repository so concurrent purchases
    /// can never oversell.
    #[tracing::instrument(skip(self))]
    pub async fn purchase(
        &self,
        buyer: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<ProductDto> {
        let product = self.load(product_id).await?;
        product.ensure_active()?;

        let product = self
            .products
            .decrement_stock(product_id, quantity, self.clock.now())
            .await?;

        metrics::counter!("product_units_sold_total").increment(u64::from(quantity));
        tracing::info!(%product_id, %buyer, quantity, remaining = product.stock(), "purchase recorded");

        Ok(ProductDto::from(&product))
    }

    /// Flips the active flag. Owner only.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_status(&self, actor: UserId, product_id: ProductId) -> Result<ProductDto> {
        let mut product = self.load_owned(actor, product_id).await?;
        let active = product.toggle_active(self.clock.now());
        let product = self.products.update(&product).await?;

        tracing::info!(%product_id, active, "product status toggled");
        Ok(ProductDto::from(&product))
    }

    /// Soft delete: the product is deactivated and kept.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, actor: UserId, product_id: ProductId) -> Result<()> {
        let mut product = self.load_owned(actor, product_id).await?;
        product.deactivate(self.clock.now());
        self.products.update(&product).await?;

        tracing::info!(%product_id, "product deleted");
        Ok(())
    }

    async fn load(&self, product_id: ProductId) -> Result<Product> {
        self.products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Product", product_id))
    }

    async fn load_vendor(&self, vendor_id: VendorId) -> Result<Vendor> {
        self.vendors
            .find_by_id(vendor_id)
            .await?
            .ok_or_else(|| AppError::not_found("Vendor", vendor_id))
    }

    async fn load_owned(&self, actor: UserId, product_id: ProductId) -> Result<Product> {
        let product = self.load(product_id).await?;
        let vendor = self.load_vendor(product.vendor_id()).await?;
        if !vendor.is_owned_by(actor) {
            return Err(AppError::unauthorized(
                "only the vendor owner can change this product",
            ));
        }
        Ok(product)
    }
}
