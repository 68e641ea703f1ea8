//! Records crossing the application boundary.
//!
//! Output DTOs are flat snapshots of entities plus derived values. Input
//! DTOs carry raw fields; the services parse them into value objects.

use chrono::{DateTime, Utc};
use common::{ProductId, PromotionId, UserId, VendorId};
use domain::{
    Address, Cancellation, PaymentStatus, Product, Promotion, PromotionStatus, RankedVendor,
    Role, User, Vendor, VendorType,
};
use serde::{Deserialize, Serialize};

// Output

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorDto {
    pub id: VendorId,
    pub user_id: UserId,
    pub company_name: String,
    pub tax_id: String,
    pub tax_id_formatted: String,
    pub vendor_type: VendorType,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Address,
    pub phone: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Vendor> for VendorDto {
    fn from(vendor: &Vendor) -> Self {
        Self {
            id: vendor.id(),
            user_id: vendor.user_id(),
            company_name: vendor.company_name().to_string(),
            tax_id: vendor.tax_id().as_str().to_string(),
            tax_id_formatted: vendor.tax_id().formatted(),
            vendor_type: vendor.vendor_type(),
            latitude: vendor.location().latitude(),
            longitude: vendor.location().longitude(),
            address: vendor.address().clone(),
            phone: vendor.phone().map(str::to_string),
            verified: vendor.is_verified(),
            created_at: vendor.created_at(),
            updated_at: vendor.updated_at(),
        }
    }
}

/// A vendor in a nearby search, with its distance from the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyVendorDto {
    #[serde(flatten)]
    pub vendor: VendorDto,
    pub distance_m: f64,
}

impl From<RankedVendor> for NearbyVendorDto {
    fn from(ranked: RankedVendor) -> Self {
        Self {
            vendor: VendorDto::from(&ranked.vendor),
            distance_m: ranked.distance_m,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDto {
    pub id: ProductId,
    pub vendor_id: VendorId,
    pub brand: String,
    pub volume_ml: u32,
    pub volume_in_liters: f64,
    pub price_cents: i64,
    pub price_per_liter_cents: i64,
    pub stock: u32,
    pub active: bool,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductDto {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id(),
            vendor_id: product.vendor_id(),
            brand: product.brand().to_string(),
            volume_ml: product.volume().ml(),
            volume_in_liters: product.volume_in_liters(),
            price_cents: product.price().cents(),
            price_per_liter_cents: product.price_per_liter().cents(),
            stock: product.stock(),
            active: product.is_active(),
            description: product.description().map(str::to_string),
            image_url: product.image_url().map(str::to_string),
            created_at: product.created_at(),
            updated_at: product.updated_at(),
        }
    }
}

/// A product together with the vendor selling it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetailsDto {
    pub product: ProductDto,
    pub vendor: VendorDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionDto {
    pub id: PromotionId,
    pub product_id: ProductId,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub priority: u8,
    pub status: PromotionStatus,
    pub payment_status: PaymentStatus,
    pub duration_in_days: i64,
    pub remaining_days: i64,
    pub active_now: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PromotionDto {
    /// `remaining_days` and `active_now` depend on the time of the snapshot.
    pub fn at(promotion: &Promotion, now: DateTime<Utc>) -> Self {
        Self {
            id: promotion.id(),
            product_id: promotion.product_id(),
            starts_at: promotion.starts_at(),
            ends_at: promotion.ends_at(),
            priority: promotion.priority(),
            status: promotion.status(),
            payment_status: promotion.payment_status(),
            duration_in_days: promotion.duration_in_days(),
            remaining_days: promotion.remaining_days(now),
            active_now: promotion.is_active_now(now),
            created_at: promotion.created_at(),
            updated_at: promotion.updated_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub adult_confirmed: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            name: user.name().to_string(),
            email: user.email().as_str().to_string(),
            role: user.role(),
            adult_confirmed: user.is_adult_confirmed(),
            email_verified: user.is_email_verified(),
            created_at: user.created_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokensDto {
    pub user: UserDto,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationDto {
    pub refund_eligible: bool,
    pub message: String,
}

impl From<Cancellation> for CancellationDto {
    fn from(cancellation: Cancellation) -> Self {
        let message = if cancellation.refunded {
            "Promotion cancelled successfully. Refund will be processed."
        } else {
            "Promotion cancelled successfully."
        };
        Self {
            refund_eligible: cancellation.refunded,
            message: message.to_string(),
        }
    }
}

/// Outcome of one expiry sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirySummary {
    pub expired_count: usize,
}

/// A plain acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub message: String,
}

impl MessageDto {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Reply to a password reset request.
///
/// The message is identical whether or not the email is registered. The
/// token is handed back so that a mail collaborator can deliver it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetRequestedDto {
    pub message: String,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
}

// Input

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterVendorDto {
    pub company_name: String,
    pub tax_id: String,
    pub vendor_type: VendorType,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Address,
    pub phone: Option<String>,
}

/// Partial vendor update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVendorDto {
    pub company_name: Option<String>,
    pub vendor_type: Option<VendorType>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<Address>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchNearbyDto {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
    pub vendor_type: Option<VendorType>,
    #[serde(default)]
    pub verified_only: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductDto {
    pub brand: String,
    pub volume_ml: u32,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: u32,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Partial product update. Absent fields are left unchanged.
///
/// `stock` is a target level; the service reaches it through increase or
/// decrease so stock rules still apply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductDto {
    pub brand: Option<String>,
    pub volume_ml: Option<u32>,
    pub price_cents: Option<i64>,
    pub stock: Option<u32>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Relative stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "direction", content = "quantity", rename_all = "lowercase")]
pub enum StockAdjustment {
    Increase(u32),
    Decrease(u32),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchProductsDto {
    pub brand: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub volume_ml: Option<u32>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePromotionDto {
    pub product_id: ProductId,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub priority: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUserDto {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub adult_confirmed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginDto {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordDto {
    pub token: String,
    pub password: String,
    pub password_confirmation: String,
}
