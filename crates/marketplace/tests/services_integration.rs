//! Integration tests for the application services over in-memory stores.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use common::{Page, PageRequest, ProductId, PromotionId, UserId, VendorId};
use domain::{
    Address, EmailAddress, ErrorKind, FixedClock, NewUser, PaymentStatus, Product, ProductSearch,
    PromotionStatus, Role, User, VendorType,
};
use marketplace::dto::{
    CreateProductDto, CreatePromotionDto, LoginDto, RegisterUserDto, RegisterVendorDto,
    ResetPasswordDto, SearchNearbyDto, SearchProductsDto, StockAdjustment, UpdateProductDto,
    UpdateVendorDto,
};
use marketplace::{
    AccountService, CredentialError, InMemoryTokenIssuer, PasswordHasher, ProductService,
    PromotionService, TokenPolicy, VendorService,
};
use store::{
    InMemoryProductRepository, InMemoryPromotionRepository, InMemoryUserRepository,
    InMemoryVendorRepository, ProductRepository, UserRepository,
};

/// Reversible stand-in for Argon2 so the suite stays fast.
struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, CredentialError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, CredentialError> {
        Ok(hash == format!("plain:{password}"))
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

struct Harness {
    clock: FixedClock,
    users: InMemoryUserRepository,
    vendor_repo: InMemoryVendorRepository,
    product_repo: InMemoryProductRepository,
    vendors: VendorService,
    products: ProductService,
    promotions: PromotionService,
    accounts: AccountService,
}

impl Harness {
    fn new() -> Self {
        let clock = FixedClock::new(t0());
        let users = InMemoryUserRepository::new();
        let vendor_repo = InMemoryVendorRepository::new();
        let product_repo = InMemoryProductRepository::new(vendor_repo.clone());
        let promotion_repo = InMemoryPromotionRepository::new();

        let clock_arc = Arc::new(clock.clone());
        Self {
            vendors: VendorService::new(
                Arc::new(vendor_repo.clone()),
                Arc::new(users.clone()),
                clock_arc.clone(),
            ),
            products: ProductService::new(
                Arc::new(product_repo.clone()),
                Arc::new(vendor_repo.clone()),
                clock_arc.clone(),
            ),
            promotions: PromotionService::new(
                Arc::new(promotion_repo),
                Arc::new(product_repo.clone()),
                Arc::new(vendor_repo.clone()),
                Arc::new(users.clone()),
                clock_arc.clone(),
            ),
            accounts: AccountService::new(
                Arc::new(users.clone()),
                Arc::new(PlainHasher),
                Arc::new(InMemoryTokenIssuer::new(clock_arc.clone())),
                clock_arc,
                TokenPolicy::default(),
            ),
            clock,
            users,
            vendor_repo,
            product_repo,
        }
    }

    /// A product service over `products` instead of the shared repository.
    fn products_over(&self, products: Arc<dyn ProductRepository>) -> ProductService {
        ProductService::new(
            products,
            Arc::new(self.vendor_repo.clone()),
            Arc::new(self.clock.clone()),
        )
    }

    /// Records a payment through a fresh admin account.
    async fn pay(&self, promotion_id: PromotionId) {
        let admin = self
            .user(&format!("payments-{promotion_id}@example.com"), Role::Admin)
            .await;
        self.promotions.mark_paid(admin, promotion_id).await.unwrap();
    }

    async fn user(&self, email: &str, role: Role) -> UserId {
        let user = User::register(
            NewUser {
                name: "Test User".into(),
                email: EmailAddress::parse(email).unwrap(),
                password_hash: "plain:password123".into(),
                role,
                adult_confirmed: true,
            },
            t0(),
        )
        .unwrap();
        self.users.save(&user).await.unwrap();
        user.id()
    }

    /// Registers and verifies a vendor at `(lat, lon)`; returns owner and vendor.
    async fn vendor(&self, tax_id: &str, lat: f64, lon: f64, kind: VendorType) -> (UserId, VendorId) {
        let owner = self.user(&format!("owner-{tax_id}@example.com"), Role::Vendor).await;
        let admin = self.user(&format!("admin-{tax_id}@example.com"), Role::Admin).await;

        let vendor = self
            .vendors
            .register_vendor(owner, register_vendor_dto(tax_id, lat, lon, kind))
            .await
            .unwrap();
        self.vendors.verify_vendor(admin, vendor.id).await.unwrap();
        (owner, vendor.id)
    }
}

fn address() -> Address {
    Address {
        street: "Rua Augusta".into(),
        number: "100".into(),
        city: "São Paulo".into(),
        state: "SP".into(),
        zip: "01305-000".into(),
    }
}

fn register_vendor_dto(tax_id: &str, lat: f64, lon: f64, kind: VendorType) -> RegisterVendorDto {
    RegisterVendorDto {
        company_name: "Bar do Zé".into(),
        tax_id: tax_id.into(),
        vendor_type: kind,
        latitude: lat,
        longitude: lon,
        address: address(),
        phone: None,
    }
}

fn product_dto(brand: &str, stock: u32) -> CreateProductDto {
    CreateProductDto {
        brand: brand.into(),
        volume_ml: 350,
        price_cents: 499,
        stock,
        description: None,
        image_url: None,
    }
}

mod vendors {
    use super::*;

    #[tokio::test]
    async fn register_requires_vendor_role() {
        let h = Harness::new();
        let client = h.user("client@example.com", Role::Client).await;

        let err = h
            .vendors
            .register_vendor(
                client,
                register_vendor_dto("11222333000181", -23.55, -46.63, VendorType::Bar),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));
    }

    #[tokio::test]
    async fn register_rejects_invalid_and_duplicate_tax_id() {
        let h = Harness::new();
        let owner = h.user("a@example.com", Role::Vendor).await;
        let other = h.user("b@example.com", Role::Vendor).await;

        let err = h
            .vendors
            .register_vendor(
                owner,
                register_vendor_dto("11222333000182", -23.55, -46.63, VendorType::Bar),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));

        h.vendors
            .register_vendor(
                owner,
                register_vendor_dto("11.222.333/0001-81", -23.55, -46.63, VendorType::Bar),
            )
            .await
            .unwrap();

        let err = h
            .vendors
            .register_vendor(
                other,
                register_vendor_dto("11222333000181", -23.55, -46.63, VendorType::Bar),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Conflict));
    }

    #[tokio::test]
    async fn one_vendor_per_user() {
        let h = Harness::new();
        let owner = h.user("a@example.com", Role::Vendor).await;

        h.vendors
            .register_vendor(
                owner,
                register_vendor_dto("11222333000181", -23.55, -46.63, VendorType::Bar),
            )
            .await
            .unwrap();
        let err = h
            .vendors
            .register_vendor(
                owner,
                register_vendor_dto("11444777000161", -23.55, -46.63, VendorType::Bar),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Conflict));
    }

    #[tokio::test]
    async fn only_admin_verifies_and_only_owner_updates() {
        let h = Harness::new();
        let owner = h.user("a@example.com", Role::Vendor).await;
        let vendor = h
            .vendors
            .register_vendor(
                owner,
                register_vendor_dto("11222333000181", -23.55, -46.63, VendorType::Bar),
            )
            .await
            .unwrap();
        assert!(!vendor.verified);

        let err = h.vendors.verify_vendor(owner, vendor.id).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));

        let stranger = h.user("c@example.com", Role::Vendor).await;
        let update = UpdateVendorDto {
            company_name: Some("Novo Nome".into()),
            ..UpdateVendorDto::default()
        };
        let err = h
            .vendors
            .update_vendor(stranger, vendor.id, update.clone())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));

        let updated = h.vendors.update_vendor(owner, vendor.id, update).await.unwrap();
        assert_eq!(updated.company_name, "Novo Nome");
    }

    #[tokio::test]
    async fn search_nearby_ranks_and_filters() {
        let h = Harness::new();
        // ~1.1 km and ~3.3 km north of the origin.
        h.vendor("11222333000181", -23.54, -46.6333, VendorType::Bar).await;
        h.vendor("11444777000161", -23.52, -46.6333, VendorType::Bar).await;
        h.vendor("00011000000006", -23.545, -46.6333, VendorType::Market).await;

        let page = h
            .vendors
            .search_nearby(SearchNearbyDto {
                latitude: -23.55,
                longitude: -46.6333,
                radius_m: 5000.0,
                vendor_type: Some(VendorType::Bar),
                verified_only: true,
                page: None,
                limit: None,
            })
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|v| v.vendor.vendor_type == VendorType::Bar));
        assert!(page.items[0].distance_m < page.items[1].distance_m);
    }

    #[tokio::test]
    async fn search_nearby_rejects_radius_out_of_range() {
        let h = Harness::new();
        for radius_m in [0.0, 50_001.0] {
            let err = h
                .vendors
                .search_nearby(SearchNearbyDto {
                    latitude: -23.55,
                    longitude: -46.63,
                    radius_m,
                    vendor_type: None,
                    verified_only: false,
                    page: None,
                    limit: None,
                })
                .await
                .unwrap_err();
            assert_eq!(err.kind(), Some(ErrorKind::Validation));
        }
    }
}

mod products {
    use super::*;

    #[tokio::test]
    async fn create_requires_verified_vendor_owned_by_actor() {
        let h = Harness::new();
        let owner = h.user("a@example.com", Role::Vendor).await;
        let vendor = h
            .vendors
            .register_vendor(
                owner,
                register_vendor_dto("11222333000181", -23.55, -46.63, VendorType::Bar),
            )
            .await
            .unwrap();

        let err = h
            .products
            .create_product(owner, vendor.id, product_dto("Heineken", 10))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));

        let (other_owner, other_vendor) =
            h.vendor("11444777000161", -23.55, -46.63, VendorType::Bar).await;
        let err = h
            .products
            .create_product(owner, other_vendor, product_dto("Heineken", 10))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));

        let product = h
            .products
            .create_product(other_owner, other_vendor, product_dto("Heineken", 10))
            .await
            .unwrap();
        assert!(product.active);
        assert_eq!(product.price_per_liter_cents, 1426);
    }

    #[tokio::test]
    async fn create_rejects_unknown_volume_and_zero_price() {
        let h = Harness::new();
        let (owner, vendor) = h.vendor("11222333000181", -23.55, -46.63, VendorType::Bar).await;

        let mut dto = product_dto("Heineken", 1);
        dto.volume_ml = 333;
        let err = h.products.create_product(owner, vendor, dto).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));

        let mut dto = product_dto("Heineken", 1);
        dto.price_cents = 0;
        let err = h.products.create_product(owner, vendor, dto).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));
    }

    #[tokio::test]
    async fn inactive_products_listed_only_to_owner() {
        let h = Harness::new();
        let (owner, vendor) = h.vendor("11222333000181", -23.55, -46.63, VendorType::Bar).await;
        let product = h
            .products
            .create_product(owner, vendor, product_dto("Heineken", 1))
            .await
            .unwrap();
        h.products.delete_product(owner, product.id).await.unwrap();

        let stranger = h.user("x@example.com", Role::Client).await;
        let page = h
            .products
            .list_vendor_products(Some(stranger), vendor, true, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);

        let page = h
            .products
            .list_vendor_products(Some(owner), vendor, true, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert!(!page.items[0].active);
    }

    #[tokio::test]
    async fn search_and_suggestions() {
        let h = Harness::new();
        let (owner, vendor) = h.vendor("11222333000181", -23.55, -46.63, VendorType::Bar).await;
        for brand in ["Heineken", "Brahma", "Budweiser"] {
            h.products
                .create_product(owner, vendor, product_dto(brand, 5))
                .await
                .unwrap();
        }

        let page = h
            .products
            .search_products(SearchProductsDto {
                brand: Some("HEIN".into()),
                state: Some("sp".into()),
                ..SearchProductsDto::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].brand, "Heineken");

        let err = h
            .products
            .search_products(SearchProductsDto {
                min_price_cents: Some(500),
                max_price_cents: Some(100),
                ..SearchProductsDto::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));

        assert!(h.products.brand_suggestions("b", None).await.unwrap().is_empty());
        assert_eq!(
            h.products.brand_suggestions("br", None).await.unwrap(),
            vec!["Brahma".to_string()]
        );
        assert_eq!(h.products.brand_suggestions("bu", Some(50)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stock_changes_go_through_named_operations() {
        let h = Harness::new();
        let (owner, vendor) = h.vendor("11222333000181", -23.55, -46.63, VendorType::Bar).await;
        let product = h
            .products
            .create_product(owner, vendor, product_dto("Heineken", 5))
            .await
            .unwrap();

        let updated = h
            .products
            .adjust_stock(owner, product.id, StockAdjustment::Increase(5))
            .await
            .unwrap();
        assert_eq!(updated.stock, 10);

        let err = h
            .products
            .adjust_stock(owner, product.id, StockAdjustment::Decrease(11))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InsufficientStock));

        let updated = h
            .products
            .update_product(
                owner,
                product.id,
                UpdateProductDto {
                    stock: Some(2),
                    price_cents: Some(599),
                    volume_ml: Some(600),
                    ..UpdateProductDto::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.stock, 2);
        assert_eq!(updated.price_cents, 599);
        assert_eq!(updated.volume_ml, 600);

        let buyer = h.user("buyer@example.com", Role::Client).await;
        h.products.purchase(buyer, product.id, 2).await.unwrap();
        let err = h.products.purchase(buyer, product.id, 1).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InsufficientStock));
    }

    #[tokio::test]
    async fn purchase_of_inactive_product_is_rejected() {
        let h = Harness::new();
        let (owner, vendor) = h.vendor("11222333000181", -23.55, -46.63, VendorType::Bar).await;
        let product = h
            .products
            .create_product(owner, vendor, product_dto("Heineken", 5))
            .await
            .unwrap();

        let toggled = h.products.toggle_status(owner, product.id).await.unwrap();
        assert!(!toggled.active);

        let buyer = h.user("buyer@example.com", Role::Client).await;
        let err = h.products.purchase(buyer, product.id, 1).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));
    }

    #[tokio::test]
    async fn sale_between_read_and_write_is_not_lost() {
        let h = Harness::new();
        let (owner, vendor) = h.vendor("11222333000181", -23.55, -46.63, VendorType::Bar).await;
        let product = h
            .products
            .create_product(owner, vendor, product_dto("Heineken", 10))
            .await
            .unwrap();

        let racing = Arc::new(SaleOnNextRead::new(h.product_repo.clone()));
        let products = h.products_over(racing.clone());

        racing.arm(5);
        let adjusted = products
            .adjust_stock(owner, product.id, StockAdjustment::Decrease(3))
            .await
            .unwrap();
        assert_eq!(adjusted.stock, 2);

        racing.arm(2);
        let err = products
            .update_price(owner, product.id, 599)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Conflict));

        let stored = h.products.get_product_details(product.id).await.unwrap();
        assert_eq!(stored.product.stock, 0);
        assert_eq!(stored.product.price_cents, 499);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sales_and_restocks_add_up() {
        let h = Harness::new();
        let (owner, vendor) = h.vendor("11222333000181", -23.55, -46.63, VendorType::Bar).await;
        let buyer = h.user("buyer@example.com", Role::Client).await;
        let product = h
            .products
            .create_product(owner, vendor, product_dto("Heineken", 50))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..40 {
            let products = h.products.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    products.purchase(buyer, product.id, 2).await
                } else {
                    products
                        .adjust_stock(owner, product.id, StockAdjustment::Increase(1))
                        .await
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = h.products.get_product_details(product.id).await.unwrap();
        assert_eq!(stored.product.stock, 50 - 20 * 2 + 20);
    }
}

/// Sells the armed quantity through the inner repository right after the
/// next read, as a concurrent buyer would.
struct SaleOnNextRead {
    inner: InMemoryProductRepository,
    pending: AtomicU32,
}

impl SaleOnNextRead {
    fn new(inner: InMemoryProductRepository) -> Self {
        Self {
            inner,
            pending: AtomicU32::new(0),
        }
    }

    fn arm(&self, quantity: u32) {
        self.pending.store(quantity, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProductRepository for SaleOnNextRead {
    async fn find_by_id(&self, id: ProductId) -> store::Result<Option<Product>> {
        let found = self.inner.find_by_id(id).await?;
        let quantity = self.pending.swap(0, Ordering::SeqCst);
        if found.is_some() && quantity > 0 {
            self.inner.decrement_stock(id, quantity, t0()).await?;
        }
        Ok(found)
    }

    async fn find_by_vendor(
        &self,
        vendor_id: VendorId,
        include_inactive: bool,
        page: PageRequest,
    ) -> store::Result<Page<Product>> {
        self.inner.find_by_vendor(vendor_id, include_inactive, page).await
    }

    async fn search(&self, search: &ProductSearch, page: PageRequest) -> store::Result<Page<Product>> {
        self.inner.search(search, page).await
    }

    async fn save(&self, product: &Product) -> store::Result<()> {
        self.inner.save(product).await
    }

    async fn update(&self, product: &Product) -> store::Result<Product> {
        self.inner.update(product).await
    }

    async fn brand_suggestions(&self, prefix: &str, limit: usize) -> store::Result<Vec<String>> {
        self.inner.brand_suggestions(prefix, limit).await
    }

    async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> store::Result<Product> {
        self.inner.decrement_stock(id, quantity, now).await
    }

    async fn increment_stock(
        &self,
        id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> store::Result<Product> {
        self.inner.increment_stock(id, quantity, now).await
    }
}

mod promotions {
    use super::*;

    async fn setup(h: &Harness) -> (UserId, common::ProductId) {
        let (owner, vendor) = h.vendor("11222333000181", -23.55, -46.63, VendorType::Bar).await;
        let product = h
            .products
            .create_product(owner, vendor, product_dto("Heineken", 5))
            .await
            .unwrap();
        (owner, product.id)
    }

    fn promotion_dto(product_id: common::ProductId, start_in: Duration, days: i64) -> CreatePromotionDto {
        CreatePromotionDto {
            product_id,
            starts_at: t0() + start_in,
            ends_at: t0() + start_in + Duration::days(days),
            priority: 5,
        }
    }

    #[tokio::test]
    async fn create_starts_active_and_pending() {
        let h = Harness::new();
        let (owner, product_id) = setup(&h).await;

        let promotion = h
            .promotions
            .create_promotion(owner, promotion_dto(product_id, Duration::days(1), 7))
            .await
            .unwrap();
        assert_eq!(promotion.status, PromotionStatus::Active);
        assert_eq!(promotion.payment_status, PaymentStatus::Pending);
        assert_eq!(promotion.duration_in_days, 7);
        assert!(!promotion.active_now);
    }

    #[tokio::test]
    async fn create_rejects_past_start_and_foreign_product() {
        let h = Harness::new();
        let (owner, product_id) = setup(&h).await;

        let err = h
            .promotions
            .create_promotion(owner, promotion_dto(product_id, Duration::hours(-1), 7))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));

        let stranger = h.user("x@example.com", Role::Vendor).await;
        let err = h
            .promotions
            .create_promotion(stranger, promotion_dto(product_id, Duration::days(1), 7))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));
    }

    #[tokio::test]
    async fn only_admins_record_payments() {
        let h = Harness::new();
        let (owner, product_id) = setup(&h).await;
        let promotion = h
            .promotions
            .create_promotion(owner, promotion_dto(product_id, Duration::days(1), 7))
            .await
            .unwrap();

        let err = h.promotions.mark_paid(owner, promotion.id).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));
        let err = h
            .promotions
            .mark_paid(UserId::new(), promotion.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));

        let stored = h.promotions.get_promotion(promotion.id).await.unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Pending);

        h.pay(promotion.id).await;
        let stored = h.promotions.get_promotion(promotion.id).await.unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn cancel_before_start_refunds_paid_promotion() {
        let h = Harness::new();
        let (owner, product_id) = setup(&h).await;
        let promotion = h
            .promotions
            .create_promotion(owner, promotion_dto(product_id, Duration::days(1), 7))
            .await
            .unwrap();
        h.pay(promotion.id).await;

        let cancellation = h.promotions.cancel_promotion(owner, promotion.id).await.unwrap();
        assert!(cancellation.refund_eligible);

        let stored = h.promotions.get_promotion(promotion.id).await.unwrap();
        assert_eq!(stored.status, PromotionStatus::Cancelled);
        assert_eq!(stored.payment_status, PaymentStatus::Refunded);

        let err = h
            .promotions
            .cancel_promotion(owner, promotion.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));
    }

    #[tokio::test]
    async fn cancel_after_start_keeps_payment() {
        let h = Harness::new();
        let (owner, product_id) = setup(&h).await;
        let promotion = h
            .promotions
            .create_promotion(owner, promotion_dto(product_id, Duration::hours(1), 7))
            .await
            .unwrap();
        h.pay(promotion.id).await;
        h.clock.advance(Duration::hours(2));

        let cancellation = h.promotions.cancel_promotion(owner, promotion.id).await.unwrap();
        assert!(!cancellation.refund_eligible);
        assert_eq!(cancellation.message, "Promotion cancelled successfully.");

        let stored = h.promotions.get_promotion(promotion.id).await.unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn list_active_requires_payment_and_window() {
        let h = Harness::new();
        let (owner, product_id) = setup(&h).await;
        let paid = h
            .promotions
            .create_promotion(owner, promotion_dto(product_id, Duration::hours(1), 3))
            .await
            .unwrap();
        h.promotions
            .create_promotion(owner, promotion_dto(product_id, Duration::hours(1), 3))
            .await
            .unwrap();
        h.pay(paid.id).await;

        assert!(h
            .promotions
            .list_active(PageRequest::default())
            .await
            .unwrap()
            .items
            .is_empty());

        h.clock.advance(Duration::hours(2));
        let page = h.promotions.list_active(PageRequest::default()).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, paid.id);
    }

    #[tokio::test]
    async fn expiry_sweep_is_idempotent() {
        let h = Harness::new();
        let (owner, product_id) = setup(&h).await;
        for _ in 0..3 {
            h.promotions
                .create_promotion(owner, promotion_dto(product_id, Duration::hours(1), 2))
                .await
                .unwrap();
        }
        let long = h
            .promotions
            .create_promotion(owner, promotion_dto(product_id, Duration::hours(1), 30))
            .await
            .unwrap();

        h.clock.advance(Duration::days(5));
        assert_eq!(h.promotions.expire_stale().await.unwrap().expired_count, 3);
        assert_eq!(h.promotions.expire_stale().await.unwrap().expired_count, 0);

        let stored = h.promotions.get_promotion(long.id).await.unwrap();
        assert_eq!(stored.status, PromotionStatus::Active);
    }

    #[tokio::test]
    async fn extend_revives_expired_promotion_and_activate_rejects_past_end() {
        let h = Harness::new();
        let (owner, product_id) = setup(&h).await;
        let promotion = h
            .promotions
            .create_promotion(owner, promotion_dto(product_id, Duration::hours(1), 2))
            .await
            .unwrap();
        h.pay(promotion.id).await;

        h.clock.advance(Duration::days(5));
        h.promotions.expire_stale().await.unwrap();

        let err = h.promotions.activate(owner, promotion.id).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ExpiredPromotion));

        let err = h
            .promotions
            .cancel_promotion(owner, promotion.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));

        let extended = h
            .promotions
            .extend(owner, promotion.id, t0() + Duration::days(10))
            .await
            .unwrap();
        assert_eq!(extended.status, PromotionStatus::Active);
        assert!(extended.active_now);
    }
}

mod accounts {
    use super::*;

    fn registration(email: &str) -> RegisterUserDto {
        RegisterUserDto {
            name: "Maria".into(),
            email: email.into(),
            password: "password123".into(),
            role: Role::Client,
            adult_confirmed: true,
        }
    }

    #[tokio::test]
    async fn register_and_login() {
        let h = Harness::new();
        let tokens = h.accounts.register(registration("Maria@Example.com")).await.unwrap();
        assert_eq!(tokens.user.email, "maria@example.com");
        assert_ne!(tokens.access_token, tokens.refresh_token);

        let login = h
            .accounts
            .authenticate(LoginDto {
                email: "maria@example.com".into(),
                password: "password123".into(),
            })
            .await
            .unwrap();
        assert_eq!(login.user.id, tokens.user.id);

        let refreshed = h.accounts.refresh(&login.refresh_token).await.unwrap();
        assert_eq!(refreshed.user.id, tokens.user.id);
        assert!(h.accounts.refresh(&login.access_token).await.is_err());
    }

    #[tokio::test]
    async fn register_rules() {
        let h = Harness::new();
        h.accounts.register(registration("a@example.com")).await.unwrap();

        let err = h.accounts.register(registration("a@example.com")).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Conflict));

        let mut dto = registration("b@example.com");
        dto.password = "short".into();
        assert_eq!(
            h.accounts.register(dto).await.unwrap_err().kind(),
            Some(ErrorKind::Validation)
        );

        let mut dto = registration("c@example.com");
        dto.adult_confirmed = false;
        assert_eq!(
            h.accounts.register(dto).await.unwrap_err().kind(),
            Some(ErrorKind::Validation)
        );

        let mut dto = registration("d@example.com");
        dto.role = Role::Admin;
        assert_eq!(
            h.accounts.register(dto).await.unwrap_err().kind(),
            Some(ErrorKind::Unauthorized)
        );
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let h = Harness::new();
        h.accounts.register(registration("a@example.com")).await.unwrap();

        let wrong = h
            .accounts
            .authenticate(LoginDto {
                email: "a@example.com".into(),
                password: "nope-nope".into(),
            })
            .await
            .unwrap_err();
        let unknown = h
            .accounts
            .authenticate(LoginDto {
                email: "ghost@example.com".into(),
                password: "password123".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong.kind(), Some(ErrorKind::Unauthorized));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn deleted_account_cannot_login() {
        let h = Harness::new();
        let tokens = h.accounts.register(registration("a@example.com")).await.unwrap();
        h.accounts.delete_account(tokens.user.id).await.unwrap();

        let err = h
            .accounts
            .authenticate(LoginDto {
                email: "a@example.com".into(),
                password: "password123".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));
    }

    #[tokio::test]
    async fn email_confirmation() {
        let h = Harness::new();
        let tokens = h.accounts.register(registration("a@example.com")).await.unwrap();
        assert!(!tokens.user.email_verified);

        let token = h.accounts.issue_email_verification(tokens.user.id).await.unwrap();
        h.accounts.confirm_email(&token).await.unwrap();
        let again = h.accounts.confirm_email(&token).await.unwrap();
        assert_eq!(again.message, "Email already verified.");

        assert!(h.accounts.get_profile(tokens.user.id).await.unwrap().email_verified);
    }

    #[tokio::test]
    async fn password_reset_flow() {
        let h = Harness::new();
        h.accounts.register(registration("a@example.com")).await.unwrap();

        let unknown = h.accounts.request_password_reset("ghost@example.com").await.unwrap();
        let known = h.accounts.request_password_reset("a@example.com").await.unwrap();
        assert_eq!(unknown.message, known.message);
        assert!(unknown.reset_token.is_none());
        let token = known.reset_token.unwrap();

        let err = h
            .accounts
            .reset_password(ResetPasswordDto {
                token: token.clone(),
                password: "new-password".into(),
                password_confirmation: "other-password".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));

        h.accounts
            .reset_password(ResetPasswordDto {
                token,
                password: "new-password".into(),
                password_confirmation: "new-password".into(),
            })
            .await
            .unwrap();

        h.accounts
            .authenticate(LoginDto {
                email: "a@example.com".into(),
                password: "new-password".into(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reset_token_works_once() {
        let h = Harness::new();
        h.accounts.register(registration("a@example.com")).await.unwrap();
        let token = h
            .accounts
            .request_password_reset("a@example.com")
            .await
            .unwrap()
            .reset_token
            .unwrap();

        h.accounts
            .reset_password(ResetPasswordDto {
                token: token.clone(),
                password: "first-password".into(),
                password_confirmation: "first-password".into(),
            })
            .await
            .unwrap();

        let err = h
            .accounts
            .reset_password(ResetPasswordDto {
                token,
                password: "second-password".into(),
                password_confirmation: "second-password".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));

        h.accounts
            .authenticate(LoginDto {
                email: "a@example.com".into(),
                password: "first-password".into(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn access_token_resolves_to_the_live_account() {
        let h = Harness::new();
        let tokens = h.accounts.register(registration("a@example.com")).await.unwrap();

        let claims = h.accounts.authenticate_access(&tokens.access_token).await.unwrap();
        assert_eq!(claims.user_id, tokens.user.id);
        assert_eq!(claims.role, Role::Client);

        let err = h
            .accounts
            .authenticate_access(&tokens.refresh_token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));

        h.accounts.delete_account(tokens.user.id).await.unwrap();
        let err = h
            .accounts
            .authenticate_access(&tokens.access_token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));
    }

    #[tokio::test]
    async fn reset_token_expires() {
        let h = Harness::new();
        h.accounts.register(registration("a@example.com")).await.unwrap();
        let token = h
            .accounts
            .request_password_reset("a@example.com")
            .await
            .unwrap()
            .reset_token
            .unwrap();

        h.clock.advance(Duration::hours(2));
        let err = h
            .accounts
            .reset_password(ResetPasswordDto {
                token,
                password: "new-password".into(),
                password_confirmation: "new-password".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));
    }
}
