//! HTTP route handlers.

pub mod accounts;
pub mod health;
pub mod metrics;
pub mod products;
pub mod promotions;
pub mod vendors;
