//! JSON-file persistence for the storefront.
//!
//! Every collection is one JSON file holding the whole array of records.
//! A mutation reads the file, changes an in-memory copy, and atomically
//! replaces the file; a per-collection writer lock serializes mutations so
//! two racing read-modify-write cycles cannot silently drop each other's
//! update. The narrow [`Catalog`] and [`Orders`] traits are the only
//! surface the rest of the system sees.

pub mod catalog;
pub mod collection;
pub mod error;
pub mod orders;

pub use catalog::{Catalog, JsonCatalog};
pub use collection::JsonCollection;
pub use error::{Result, StoreError};
pub use orders::{JsonOrders, Orders};
