//! Vendor use-cases.

use std::sync::Arc;

use common::{Page, PageRequest, UserId, VendorId};
use domain::{
    Clock, DomainError, GeoPoint, NearbyFilter, NearbyQuery, NewVendor, TaxId, ValidationError,
    Vendor,
};
use store::{UserRepository, VendorRepository};

use crate::dto::{NearbyVendorDto, RegisterVendorDto, SearchNearbyDto, UpdateVendorDto, VendorDto};
use crate::error::{AppError, Result};

/// Registration, profile upkeep, admin verification and nearby discovery.
#[derive(Clone)]
pub struct VendorService {
    vendors: Arc<dyn VendorRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl VendorService {
    pub fn new(
        vendors: Arc<dyn VendorRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            vendors,
            users,
            clock,
        }
    }

    /// Registers the vendor profile of a `Vendor`-role user.
    ///
    /// A user owns at most one vendor and a tax id belongs to one vendor.
    #[tracing::instrument(skip(self, dto), fields(company_name = %dto.company_name))]
    pub async fn register_vendor(&self, user_id: UserId, dto: RegisterVendorDto) -> Result<VendorDto> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User", user_id))?;

        if !user.is_vendor() {
            return Err(AppError::unauthorized(
                "only vendor users can register a vendor",
            ));
        }

        if self.vendors.find_by_user_id(user_id).await?.is_some() {
            return Err(DomainError::Conflict(format!("user {user_id} already owns a vendor")).into());
        }

        let tax_id = TaxId::parse(&dto.tax_id)?;
        if self.vendors.exists_by_tax_id(&tax_id).await? {
            return Err(DomainError::Conflict(format!(
                "tax id already registered: {}",
                tax_id.formatted()
            ))
            .into());
        }

        let vendor = Vendor::register(
            NewVendor {
                user_id,
                company_name: dto.company_name,
                tax_id,
                vendor_type: dto.vendor_type,
                location: GeoPoint::new(dto.latitude, dto.longitude)?,
                address: dto.address,
                phone: dto.phone,
            },
            self.clock.now(),
        )?;
        self.vendors.save(&vendor).await?;

        metrics::counter!("vendors_registered_total").increment(1);
        tracing::info!(vendor_id = %vendor.id(), "vendor registered");

        Ok(VendorDto::from(&vendor))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_vendor(&self, vendor_id: VendorId) -> Result<VendorDto> {
        let vendor = self.load(vendor_id).await?;
        Ok(VendorDto::from(&vendor))
    }

    /// The vendor owned by `user_id`.
    #[tracing::instrument(skip(self))]
    pub async fn get_vendor_by_user(&self, user_id: UserId) -> Result<VendorDto> {
        let vendor = self
            .vendors
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Vendor", user_id))?;
        Ok(VendorDto::from(&vendor))
    }

    /// Applies a partial profile update. Owner only.
    #[tracing::instrument(skip(self, dto))]
    pub async fn update_vendor(
        &self,
        actor: UserId,
        vendor_id: VendorId,
        dto: UpdateVendorDto,
    ) -> Result<VendorDto> {
        let mut vendor = self.load(vendor_id).await?;
        if !vendor.is_owned_by(actor) {
            return Err(AppError::unauthorized(
                "only the owner can update this vendor",
            ));
        }

        let now = self.clock.now();
        if let Some(name) = dto.company_name.as_deref() {
            vendor.rename(name, now)?;
        }
        if let Some(vendor_type) = dto.vendor_type {
            vendor.change_type(vendor_type, now);
        }
        match (dto.latitude, dto.longitude) {
            (Some(latitude), Some(longitude)) => {
                vendor.relocate(GeoPoint::new(latitude, longitude)?, now);
            }
            (None, None) => {}
            _ => {
                return Err(ValidationError::Other(
                    "latitude and longitude must be updated together".into(),
                )
                .into());
            }
        }
        if let Some(address) = dto.address {
            vendor.update_address(address, now);
        }
        if let Some(phone) = dto.phone {
            vendor.update_phone(Some(phone), now);
        }

        self.vendors.update(&vendor).await?;
        tracing::info!(vendor_id = %vendor.id(), "vendor updated");

        Ok(VendorDto::from(&vendor))
    }

    /// Marks a vendor as verified. Admin only.
    #[tracing::instrument(skip(self))]
    pub async fn verify_vendor(&self, actor: UserId, vendor_id: VendorId) -> Result<VendorDto> {
        let admin = self
            .users
            .find_by_id(actor)
            .await?
            .ok_or_else(|| AppError::not_found("User", actor))?;
        if !admin.is_admin() {
            return Err(AppError::unauthorized("only admins can verify vendors"));
        }

        let mut vendor = self.load(vendor_id).await?;
        vendor.verify(self.clock.now());
        self.vendors.update(&vendor).await?;

        tracing::info!(vendor_id = %vendor.id(), admin_id = %actor, "vendor verified");
        Ok(VendorDto::from(&vendor))
    }

    /// Vendors within the radius, nearest first.
    #[tracing::instrument(skip(self))]
    pub async fn search_nearby(&self, dto: SearchNearbyDto) -> Result<Page<NearbyVendorDto>> {
        let origin = GeoPoint::new(dto.latitude, dto.longitude)?;
        let filter = NearbyFilter {
            vendor_type: dto.vendor_type,
            verified_only: dto.verified_only,
        };
        let query = NearbyQuery::new(
            origin,
            dto.radius_m,
            filter,
            PageRequest::clamped(dto.page, dto.limit),
        )?;

        let page = self.vendors.find_nearby(&query).await?;
        tracing::debug!(total = page.total, "nearby search");

        Ok(page.map(NearbyVendorDto::from))
    }

    async fn load(&self, vendor_id: VendorId) -> Result<Vendor> {
        self.vendors
            .find_by_id(vendor_id)
            .await?
            .ok_or_else(|| AppError::not_found("Vendor", vendor_id))
    }
}
