//! Order/inventory workflows.
//!
//! Three collaborators around the catalog, the order store, and the
//! payment provider:
//!
//! - [`CheckoutService`] validates a cart and opens a hosted payment
//!   session. It writes nothing; the order does not exist yet.
//! - [`PaymentEventHandler`] turns verified provider webhooks into order
//!   creation and stock decrements, idempotently.
//! - [`OrderLifecycle`] drives post-creation transitions: customer
//!   cancellation (with stock restoration), admin status updates, and
//!   refunds.

pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod service;

pub use error::{CheckoutError, Result};
pub use handler::{Handled, PaymentEventHandler};
pub use lifecycle::OrderLifecycle;
pub use service::{CheckoutConfig, CheckoutRedirect, CheckoutRequest, CheckoutService};
