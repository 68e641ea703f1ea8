//! Product entity.
//!
//! Price and stock change only through the named operations below, so a
//! product can never hold a non-positive price or a negative stock.

use chrono::{DateTime, Utc};
use common::{ProductId, VendorId};
use serde::Serialize;

use crate::error::{DomainError, Result, ValidationError};
use crate::trimmed_name;
use crate::value_objects::{Money, Volume};

/// Minimum length of a brand name.
pub const MIN_BRAND_LEN: usize = 2;

/// Highest accepted unit price: 1 000 000.00.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Input for [`Product::create`].
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub vendor_id: VendorId,
    pub brand: String,
    pub volume: Volume,
    pub price: Money,
    pub stock: u32,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// A product listed by a vendor.
///
/// Only [`Product::create`] builds one; there is no deserializing path that
/// would skip its checks:
///
/// ```compile_fail
/// let product: domain::Product = serde_json::from_str("{}").unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    id: ProductId,
    vendor_id: VendorId,
    brand: String,
    volume: Volume,
    price: Money,
    stock: u32,
    active: bool,
    description: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Accepted writes so far, for optimistic concurrency in the store.
    version: u64,
}

impl Product {
    /// Creates an active product.
    pub fn create(new: NewProduct, now: DateTime<Utc>) -> Result<Self> {
        let brand = trimmed_name("brand", &new.brand, MIN_BRAND_LEN)?;
        ensure_positive(new.price)?;

        Ok(Self {
            id: ProductId::new(),
            vendor_id: new.vendor_id,
            brand,
            volume: new.volume,
            price: new.price,
            stock: new.stock,
            active: true,
            description: new.description,
            image_url: new.image_url,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }
}

fn ensure_positive(price: Money) -> Result<()> {
    if !price.is_positive() || price.cents() > MAX_PRICE_CENTS {
        return Err(ValidationError::InvalidPrice {
            cents: price.cents(),
        }
        .into());
    }
    Ok(())
}

fn ensure_quantity(quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(ValidationError::InvalidQuantity { quantity }.into());
    }
    Ok(())
}

// Query methods
impl Product {
    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    pub fn volume_in_liters(&self) -> f64 {
        self.volume.in_liters()
    }

    /// Price normalized to one litre, rounded to the nearest cent.
    ///
    /// Prices are capped at [`MAX_PRICE_CENTS`], so the conversion always
    /// fits.
    pub fn price_per_liter(&self) -> Money {
        self.price
            .per_liter(self.volume)
            .unwrap_or(Money::from_cents(i64::MAX))
    }

    pub fn ensure_active(&self) -> Result<()> {
        if !self.active {
            return Err(ValidationError::Other(format!("Product {} is not active", self.id)).into());
        }
        Ok(())
    }

    pub fn ensure_in_stock(&self) -> Result<()> {
        if self.stock == 0 {
            return Err(DomainError::InsufficientStock {
                available: 0,
                requested: 1,
            });
        }
        Ok(())
    }
}

// Mutations
impl Product {
    pub fn update_price(&mut self, price: Money, now: DateTime<Utc>) -> Result<()> {
        ensure_positive(price)?;
        self.price = price;
        self.touch(now);
        Ok(())
    }

    pub fn increase_stock(&mut self, quantity: u32, now: DateTime<Utc>) -> Result<()> {
        ensure_quantity(quantity)?;
        self.stock = self
            .stock
            .checked_add(quantity)
            .ok_or(ValidationError::InvalidQuantity { quantity })?;
        self.touch(now);
        Ok(())
    }

    /// Removes `quantity` units. On failure the stock is left unchanged.
    pub fn decrease_stock(&mut self, quantity: u32, now: DateTime<Utc>) -> Result<()> {
        ensure_quantity(quantity)?;
        if quantity > self.stock {
            return Err(DomainError::InsufficientStock {
                available: self.stock,
                requested: quantity,
            });
        }
        self.stock -= quantity;
        self.touch(now);
        Ok(())
    }

    pub fn activate(&mut self, now: DateTime<Utc>) {
        self.active = true;
        self.touch(now);
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.active = false;
        self.touch(now);
    }

    /// Flips the active flag and returns the new value.
    pub fn toggle_active(&mut self, now: DateTime<Utc>) -> bool {
        self.active = !self.active;
        self.touch(now);
        self.active
    }

    pub fn rename_brand(&mut self, brand: &str, now: DateTime<Utc>) -> Result<()> {
        self.brand = trimmed_name("brand", brand, MIN_BRAND_LEN)?;
        self.touch(now);
        Ok(())
    }

    pub fn change_volume(&mut self, volume: Volume, now: DateTime<Utc>) {
        self.volume = volume;
        self.touch(now);
    }

    pub fn update_description(&mut self, description: Option<String>, now: DateTime<Utc>) {
        self.description = description;
        self.touch(now);
    }

    pub fn update_image(&mut self, image_url: Option<String>, now: DateTime<Utc>) {
        self.image_url = image_url;
        self.touch(now);
    }

    /// Records the version the store assigned on a successful write.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn product(stock: u32) -> Product {
        Product::create(
            NewProduct {
                vendor_id: VendorId::new(),
                brand: "Heineken".into(),
                volume: Volume::from_ml(350).unwrap(),
                price: Money::from_cents(499),
                stock,
                description: None,
                image_url: None,
            },
            now(),
        )
        .unwrap()
    }

    #[test]
    fn test_create_is_active() {
        let product = product(10);
        assert!(product.is_active());
        assert!(product.is_in_stock());
        assert_eq!(product.brand(), "Heineken");
    }

    #[test]
    fn test_create_rejects_non_positive_price() {
        let result = Product::create(
            NewProduct {
                vendor_id: VendorId::new(),
                brand: "Heineken".into(),
                volume: Volume::from_ml(350).unwrap(),
                price: Money::zero(),
                stock: 1,
                description: None,
                image_url: None,
            },
            now(),
        );
        assert_eq!(
            result,
            Err(ValidationError::InvalidPrice { cents: 0 }.into())
        );
    }

    #[test]
    fn test_price_above_cap_rejected() {
        let mut product = product(1);
        let too_high = Money::from_cents(MAX_PRICE_CENTS + 1);

        assert_eq!(
            product.update_price(too_high, now()),
            Err(ValidationError::InvalidPrice {
                cents: MAX_PRICE_CENTS + 1
            }
            .into())
        );
        product
            .update_price(Money::from_cents(MAX_PRICE_CENTS), now())
            .unwrap();
        // 1 000 000.00 per 250 ml
        let small = Product::create(
            NewProduct {
                vendor_id: VendorId::new(),
                brand: "Rare Barrel".into(),
                volume: Volume::from_ml(250).unwrap(),
                price: Money::from_cents(MAX_PRICE_CENTS),
                stock: 1,
                description: None,
                image_url: None,
            },
            now(),
        )
        .unwrap();
        assert_eq!(small.price_per_liter().cents(), 4 * MAX_PRICE_CENTS);
    }

    #[test]
    fn test_update_price() {
        let mut product = product(1);
        let later = now() + Duration::minutes(1);

        product.update_price(Money::from_cents(599), later).unwrap();
        assert_eq!(product.price().cents(), 599);
        assert_eq!(product.updated_at(), later);

        assert!(product.update_price(Money::from_cents(-1), later).is_err());
        assert_eq!(product.price().cents(), 599);
    }

    #[test]
    fn test_decrease_stock_beyond_available_leaves_stock_unchanged() {
        let mut product = product(3);

        let err = product.decrease_stock(5, now()).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                available: 3,
                requested: 5,
            }
        );
        assert_eq!(product.stock(), 3);

        product.decrease_stock(3, now()).unwrap();
        assert_eq!(product.stock(), 0);
        assert!(product.ensure_in_stock().is_err());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut product = product(3);
        assert!(product.increase_stock(0, now()).is_err());
        assert!(product.decrease_stock(0, now()).is_err());
        assert_eq!(product.stock(), 3);
    }

    #[test]
    fn test_increase_stock_overflow_rejected() {
        let mut product = product(u32::MAX);
        assert!(product.increase_stock(1, now()).is_err());
        assert_eq!(product.stock(), u32::MAX);
    }

    #[test]
    fn test_price_per_liter_rounds_to_cent() {
        // 4.99 / 0.35 = 14.2571...
        assert_eq!(product(1).price_per_liter().cents(), 1426);
        assert!((product(1).volume_in_liters() - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_toggle_active() {
        let mut product = product(1);
        assert!(!product.toggle_active(now()));
        assert!(product.ensure_active().is_err());
        assert!(product.toggle_active(now()));
        assert!(product.ensure_active().is_ok());
    }

    proptest! {
        #[test]
        fn stock_never_goes_negative(start in 0u32..1000, ops in prop::collection::vec(1u32..200, 0..20)) {
            let mut product = product(start);
            for quantity in ops {
                let before = product.stock();
                match product.decrease_stock(quantity, now()) {
                    Ok(()) => prop_assert_eq!(product.stock(), before - quantity),
                    Err(_) => prop_assert_eq!(product.stock(), before),
                }
            }
        }
    }
}
