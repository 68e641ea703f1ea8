//! Self-validating value objects.
//!
//! Construction is the only validation point; once built, a value is
//! immutable and compared by value.

mod address;
mod email;
mod geo_point;
mod money;
mod tax_id;
mod volume;

pub use address::Address;
pub use email::EmailAddress;
pub use geo_point::{EARTH_RADIUS_METERS, GeoPoint};
pub use money::Money;
pub use tax_id::TaxId;
pub use volume::{ALLOWED_VOLUMES_ML, Volume};
