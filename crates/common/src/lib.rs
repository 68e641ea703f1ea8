//! Shared types used across the marketplace crates.

pub mod page;
pub mod types;

pub use page::{Page, PageError, PageRequest};
pub use types::{ProductId, PromotionId, UserId, VendorId};
