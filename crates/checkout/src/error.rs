//! Workflow error taxonomy.

use common::OrderId;
use domain::MetadataError;
use payments::PaymentError;
use store::StoreError;
use thiserror::Error;

/// Errors from the checkout, webhook, and lifecycle workflows.
///
/// The variants follow the caller-facing taxonomy: validation, not found,
/// conflict, and authorization map to client errors at the HTTP boundary;
/// provider and store failures are server-side.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request cannot be fulfilled as stated (bad cart, bad input).
    #[error("{0}")]
    Validation(String),

    /// The referenced order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// No order holds the given payment intent.
    #[error("no order for payment intent {0}")]
    PaymentIntentNotFound(String),

    /// The order is in a state that forbids the operation.
    #[error("{0}")]
    Conflict(String),

    /// The caller is not allowed to act on this order.
    #[error("{0}")]
    Authorization(String),

    /// Session metadata on a completed payment could not be reconstructed.
    #[error("cart metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Payment provider call failed.
    #[error(transparent)]
    Provider(#[from] PaymentError),

    /// Persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for workflow operations.
pub type Result<T> = std::result::Result<T, CheckoutError>;
