//! Nearby-vendor ranking and product search filters.
//!
//! These are the single pure implementations of discovery. Storage layers
//! may push filtering down, but must return the same results as
//! [`rank_nearby`] for the same input.

use std::collections::BTreeMap;

use common::{Page, PageRequest, VendorId};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::product::Product;
use crate::value_objects::{GeoPoint, Money, Volume};
use crate::vendor::{Vendor, VendorType};

/// Largest search radius accepted by [`NearbyQuery::new`], inclusive.
pub const MAX_RADIUS_METERS: f64 = 50_000.0;

/// Optional vendor filters for a nearby search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NearbyFilter {
    pub vendor_type: Option<VendorType>,
    pub verified_only: bool,
}

impl NearbyFilter {
    pub fn matches(&self, vendor: &Vendor) -> bool {
        if self.verified_only && !vendor.is_verified() {
            return false;
        }
        self.vendor_type
            .is_none_or(|vendor_type| vendor.vendor_type() == vendor_type)
    }
}

/// A validated "who is near this point" query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyQuery {
    origin: GeoPoint,
    radius_m: f64,
    filter: NearbyFilter,
    page: PageRequest,
}

impl NearbyQuery {
    /// Rejects radii outside `(0, MAX_RADIUS_METERS]`; never clamps.
    pub fn new(
        origin: GeoPoint,
        radius_m: f64,
        filter: NearbyFilter,
        page: PageRequest,
    ) -> Result<Self> {
        if !(radius_m > 0.0 && radius_m <= MAX_RADIUS_METERS) {
            return Err(ValidationError::InvalidRadius {
                meters: radius_m,
                max: MAX_RADIUS_METERS,
            }
            .into());
        }

        Ok(Self {
            origin,
            radius_m,
            filter,
            page,
        })
    }

    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    pub fn filter(&self) -> NearbyFilter {
        self.filter
    }

    pub fn page(&self) -> PageRequest {
        self.page
    }
}

/// A vendor together with its distance from the query origin.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedVendor {
    pub vendor: Vendor,
    pub distance_m: f64,
}

/// Filters, ranks and paginates vendors around the query origin.
///
/// Ordering is by ascending distance, ties broken by creation time (oldest
/// first); vendors equal on both keep their input order. Pagination happens
/// after ordering.
pub fn rank_nearby<'a, I>(vendors: I, query: &NearbyQuery) -> Page<RankedVendor>
where
    I: IntoIterator<Item = &'a Vendor>,
{
    let origin = query.origin();

    let mut ranked: Vec<RankedVendor> = vendors
        .into_iter()
        .filter(|vendor| query.filter().matches(vendor))
        .filter_map(|vendor| {
            let distance_m = vendor.distance_to(&origin);
            (distance_m <= query.radius_m()).then(|| RankedVendor {
                vendor: vendor.clone(),
                distance_m,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.distance_m
            .total_cmp(&b.distance_m)
            .then_with(|| a.vendor.created_at().cmp(&b.vendor.created_at()))
    });

    query.page().slice(ranked)
}

/// Product search filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSearch {
    /// Case-insensitive substring of the brand.
    pub brand: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub volume: Option<Volume>,
    pub vendor_id: Option<VendorId>,
    /// Vendor state, case-insensitive.
    pub state: Option<String>,
    /// Vendor city, case-insensitive.
    pub city: Option<String>,
    /// Owner-only: also return inactive products.
    #[serde(default)]
    pub include_inactive: bool,
}

impl ProductSearch {
    /// Shorthand for a brand-only search over active products.
    pub fn by_brand(brand: impl Into<String>) -> Self {
        Self {
            brand: Some(brand.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        for price in [self.min_price, self.max_price].into_iter().flatten() {
            if price.is_negative() {
                return Err(ValidationError::InvalidPrice {
                    cents: price.cents(),
                }
                .into());
            }
        }

        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(ValidationError::InvalidPriceRange.into());
        }

        Ok(())
    }

    /// Returns true if `product` passes every filter.
    ///
    /// `vendor` is the product's vendor; when a location filter is set and
    /// the vendor is unknown the product does not match.
    pub fn matches(&self, product: &Product, vendor: Option<&Vendor>) -> bool {
        if !self.include_inactive && !product.is_active() {
            return false;
        }

        if let Some(brand) = self.brand.as_deref() {
            let needle = brand.trim().to_lowercase();
            if !product.brand().to_lowercase().contains(&needle) {
                return false;
            }
        }

        if self.min_price.is_some_and(|min| product.price() < min)
            || self.max_price.is_some_and(|max| product.price() > max)
        {
            return false;
        }

        if self.volume.is_some_and(|volume| product.volume() != volume)
            || self.vendor_id.is_some_and(|id| product.vendor_id() != id)
        {
            return false;
        }

        if self.state.is_some() || self.city.is_some() {
            let Some(vendor) = vendor else {
                return false;
            };
            let address = vendor.address();
            if self.state.as_deref().is_some_and(|s| !address.in_state(s))
                || self.city.as_deref().is_some_and(|c| !address.in_city(c))
            {
                return false;
            }
        }

        true
    }

    pub fn has_location_filter(&self) -> bool {
        self.state.is_some() || self.city.is_some()
    }
}

/// Distinct brands of active products starting with `prefix`
/// (case-insensitive), sorted, at most `limit`.
///
/// The first spelling seen for a brand is the one returned.
pub fn brand_suggestions<'a, I>(products: I, prefix: &str, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a Product>,
{
    let prefix = prefix.trim().to_lowercase();
    let mut brands: BTreeMap<String, &str> = BTreeMap::new();

    for product in products {
        if !product.is_active() {
            continue;
        }
        let key = product.brand().to_lowercase();
        if key.starts_with(&prefix) {
            brands.entry(key).or_insert(product.brand());
        }
    }

    brands
        .into_values()
        .take(limit)
        .map(str::to_string)
        .collect()
}
