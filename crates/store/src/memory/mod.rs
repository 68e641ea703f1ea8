//! In-memory repositories.
//!
//! Each store keeps its entities in insertion order behind an
//! `Arc<RwLock<..>>`, so clones share state.

mod products;
mod promotions;
mod users;
mod vendors;

pub use products::InMemoryProductRepository;
pub use promotions::InMemoryPromotionRepository;
pub use users::InMemoryUserRepository;
pub use vendors::InMemoryVendorRepository;
