use common::{OrderId, ProductId};
use thiserror::Error;

/// Errors that can occur when reading or writing a collection.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced product does not exist.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The referenced order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// Reading or replacing the collection file failed.
    #[error("collection file error: {0}")]
    Io(#[from] std::io::Error),

    /// The collection file does not contain valid JSON.
    #[error("collection serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
