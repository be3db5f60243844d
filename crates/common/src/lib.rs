//! Shared types used across the storefront crates.

pub mod ids;

pub use ids::{OrderId, ProductId, UserId};
