//! Application layer for the beer marketplace.
//!
//! Each service owns the repositories and collaborators it needs, reads the
//! clock once per operation and hands DTOs back to the caller. Domain rule
//! violations pass through unchanged inside [`AppError`].

pub mod accounts;
pub mod credentials;
pub mod dto;
pub mod error;
pub mod products;
pub mod promotions;
pub mod vendors;

pub use accounts::{AccountService, MIN_PASSWORD_LEN, TokenPolicy};
pub use credentials::{
    Argon2PasswordHasher, InMemoryTokenIssuer, PasswordHasher, TokenClaims, TokenIssuer,
    TokenPurpose,
};
pub use error::{AppError, CredentialError, Result};
pub use products::ProductService;
pub use promotions::PromotionService;
pub use vendors::VendorService;
