//! Domain core for the local beer marketplace.
//!
//! This crate provides:
//! - Self-validating value objects (tax id, email, coordinates, money, volume)
//! - `User`, `Vendor`, `Product` and `Promotion` entities with their invariants
//! - The promotion lifecycle state machine
//! - Nearby-vendor ranking and product search filters
//!
//! Everything here is synchronous and free of I/O. Time comes in as an
//! argument; persistence lives behind the repository traits in `store`.

pub mod clock;
pub mod discovery;
pub mod error;
pub mod product;
pub mod promotion;
pub mod user;
pub mod value_objects;
pub mod vendor;

pub use clock::{Clock, FixedClock, SystemClock};
pub use discovery::{
    MAX_RADIUS_METERS, NearbyFilter, NearbyQuery, ProductSearch, RankedVendor, brand_suggestions,
    rank_nearby,
};
pub use error::{DomainError, ErrorKind, ValidationError};
pub use product::{NewProduct, Product};
pub use promotion::{
    Cancellation, ExpireOutcome, NewPromotion, PaymentStatus, Promotion, PromotionStatus,
};
pub use user::{NewUser, Role, User};
pub use value_objects::{Address, EmailAddress, GeoPoint, Money, TaxId, Volume};
pub use vendor::{NewVendor, Vendor, VendorType};

/// Trims `raw` and checks it has at least `min` characters.
pub(crate) fn trimmed_name(
    field: &'static str,
    raw: &str,
    min: usize,
) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() < min {
        return Err(ValidationError::InvalidName { field, min });
    }
    Ok(trimmed.to_string())
}
