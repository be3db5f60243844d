//! Domain layer for the storefront.
//!
//! This crate provides the entities shared by the stores, the checkout
//! workflow, and the HTTP API:
//! - `Product` and partial-update support for the catalog
//! - `Order` with line-item snapshots and an append-only status history
//! - Closed `OrderStatus`/`PaymentStatus` enums with transition predicates
//! - `Money` in minor currency units
//! - The versioned cart metadata payload round-tripped through the
//!   payment provider

pub mod cart;
pub mod money;
pub mod order;
pub mod product;
pub mod status;

pub use cart::{CartItem, CartMetadata, MetadataError, METADATA_VERSION};
pub use money::Money;
pub use order::{Address, LineItem, NewOrder, Order, OrderUpdate, generate_order_number};
pub use product::{NewProduct, Product, ProductUpdate};
pub use status::{Actor, OrderStatus, PaymentStatus, StatusHistoryEntry};
