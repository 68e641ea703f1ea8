//! Vendor entity: a physical point of sale owned by a vendor user.

use chrono::{DateTime, Utc};
use common::{UserId, VendorId};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result, ValidationError};
use crate::trimmed_name;
use crate::value_objects::{Address, GeoPoint, TaxId};

/// Minimum length of a company name.
pub const MIN_COMPANY_NAME_LEN: usize = 2;

/// Kind of establishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorType {
    Bar,
    Market,
    Distributor,
}

impl VendorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorType::Bar => "bar",
            VendorType::Market => "market",
            VendorType::Distributor => "distributor",
        }
    }
}

impl std::fmt::Display for VendorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VendorType {
    type Err = ValidationError;

    /// Accepts the English names and the legacy Portuguese ones.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bar" => Ok(VendorType::Bar),
            "market" | "mercado" => Ok(VendorType::Market),
            "distributor" | "distribuidora" => Ok(VendorType::Distributor),
            other => Err(ValidationError::Other(format!(
                "Unknown vendor type: {other}"
            ))),
        }
    }
}

/// Input for [`Vendor::register`].
#[derive(Debug, Clone)]
pub struct NewVendor {
    pub user_id: UserId,
    pub company_name: String,
    pub tax_id: TaxId,
    pub vendor_type: VendorType,
    pub location: GeoPoint,
    pub address: Address,
    pub phone: Option<String>,
}

/// A point of sale. Starts unverified; only an admin may verify it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vendor {
    id: VendorId,
    user_id: UserId,
    company_name: String,
    tax_id: TaxId,
    vendor_type: VendorType,
    location: GeoPoint,
    address: Address,
    phone: Option<String>,
    verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Vendor {
    pub fn register(new: NewVendor, now: DateTime<Utc>) -> Result<Self> {
        let company_name =
            trimmed_name("company name", &new.company_name, MIN_COMPANY_NAME_LEN)?;

        Ok(Self {
            id: VendorId::new(),
            user_id: new.user_id,
            company_name,
            tax_id: new.tax_id,
            vendor_type: new.vendor_type,
            location: new.location,
            address: new.address,
            phone: new.phone,
            verified: false,
            created_at: now,
            updated_at: now,
        })
    }
}

// Query methods
impl Vendor {
    pub fn id(&self) -> VendorId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn tax_id(&self) -> &TaxId {
        &self.tax_id
    }

    pub fn vendor_type(&self) -> VendorType {
        self.vendor_type
    }

    pub fn location(&self) -> GeoPoint {
        self.location
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Distance in meters from this vendor to `point`.
    pub fn distance_to(&self, point: &GeoPoint) -> f64 {
        self.location.distance_to(point)
    }

    /// Same formula as [`Vendor::distance_to`], boundary included.
    pub fn is_within_radius(&self, point: &GeoPoint, radius_m: f64) -> bool {
        self.location.is_within(point, radius_m)
    }

    pub fn ensure_verified(&self) -> Result<()> {
        if !self.verified {
            return Err(DomainError::Unauthorized(format!(
                "vendor {} is not verified",
                self.id
            )));
        }
        Ok(())
    }
}

// Mutations
impl Vendor {
    /// Marks the vendor as verified. Callers must check admin rights.
    pub fn verify(&mut self, now: DateTime<Utc>) {
        self.verified = true;
        self.touch(now);
    }

    pub fn unverify(&mut self, now: DateTime<Utc>) {
        self.verified = false;
        self.touch(now);
    }

    pub fn rename(&mut self, company_name: &str, now: DateTime<Utc>) -> Result<()> {
        self.company_name = trimmed_name("company name", company_name, MIN_COMPANY_NAME_LEN)?;
        self.touch(now);
        Ok(())
    }

    pub fn relocate(&mut self, location: GeoPoint, now: DateTime<Utc>) {
        self.location = location;
        self.touch(now);
    }

    pub fn update_address(&mut self, address: Address, now: DateTime<Utc>) {
        self.address = address;
        self.touch(now);
    }

    pub fn update_phone(&mut self, phone: Option<String>, now: DateTime<Utc>) {
        self.phone = phone;
        self.touch(now);
    }

    pub fn change_type(&mut self, vendor_type: VendorType, now: DateTime<Utc>) {
        self.vendor_type = vendor_type;
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
