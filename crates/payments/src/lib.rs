//! Payment provider integration.
//!
//! The storefront never talks to Stripe directly; it goes through the
//! [`PaymentProvider`] trait. [`StripeProvider`] implements it over the
//! Stripe REST API with plain form posts (no SDK dependency), and
//! [`InMemoryProvider`] implements it for tests. Webhook payloads are
//! verified against the raw request bytes with [`verify_signature`] and
//! decoded into a [`WebhookEvent`].

pub mod error;
pub mod memory;
pub mod provider;
pub mod stripe;
pub mod webhook;

pub use error::{PaymentError, SignatureError};
pub use memory::InMemoryProvider;
pub use provider::{
    CheckoutSession, PaymentProvider, Refund, SessionLineItem, SessionRequest,
};
pub use stripe::StripeProvider;
pub use webhook::{CompletedSession, WebhookEvent, sign_payload, verify_signature};
