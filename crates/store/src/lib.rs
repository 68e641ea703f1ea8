//! Persistence boundary for the marketplace.
//!
//! The repository traits are the only way the application layer reaches
//! stored entities. The in-memory implementations back tests and the
//! default server; they give last-writer-wins semantics on `update`, and
//! the product store offers an atomic stock decrement.

pub mod error;
pub mod memory;
pub mod repository;

pub use error::{Result, StoreError};
pub use memory::{
    InMemoryProductRepository, InMemoryPromotionRepository, InMemoryUserRepository,
    InMemoryVendorRepository,
};
pub use repository::{ProductRepository, PromotionRepository, UserRepository, VendorRepository};
