//! Webhook signature verification and event decoding.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::{PaymentError, SignatureError};

/// Maximum accepted age of a webhook event, in seconds.
const TOLERANCE_SECS: i64 = 300;

/// Verifies a provider webhook signature against the raw request bytes.
///
/// The signature header carries `t=<unix>,v1=<hex hmac>`; the HMAC-SHA256
/// is computed over `"{t}.{payload}"` with the endpoint secret. Events
/// older than the tolerance window are rejected to stop replays.
pub fn verify_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), SignatureError> {
    verify_signature_at(payload, sig_header, secret, chrono::Utc::now().timestamp())
}

fn verify_signature_at(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }
    if timestamp.is_empty() || signature.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::MalformedHeader)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    let sig_bytes = hex::decode(signature).map_err(|_| SignatureError::InvalidHex)?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| SignatureError::Mismatch)?;

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::MalformedHeader)?;
    if (now - ts).abs() > TOLERANCE_SECS {
        return Err(SignatureError::Expired);
    }

    Ok(())
}

/// Computes the signature header for a payload. Test helper for driving
/// the webhook endpoint with valid signatures.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("hmac accepts any key length"));
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let sig = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={sig}")
}

/// A completed checkout session as delivered in the webhook.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompletedSession {
    #[serde(rename = "id")]
    pub session_id: String,
    #[serde(rename = "payment_intent")]
    pub payment_intent_id: Option<String>,
    pub amount_total: i64,
    pub currency: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// The webhook events the storefront reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    CheckoutCompleted(CompletedSession),
    PaymentSucceeded { payment_intent_id: String },
    PaymentFailed { payment_intent_id: String },
    /// Any event type we do not handle; acknowledged and ignored.
    Other(String),
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Deserialize)]
struct RawPaymentIntent {
    id: String,
}

impl WebhookEvent {
    /// Decodes a verified webhook payload.
    pub fn parse(payload: &[u8]) -> Result<Self, PaymentError> {
        let raw: RawEvent = serde_json::from_slice(payload)?;
        match raw.event_type.as_str() {
            "checkout.session.completed" => {
                let session: CompletedSession = serde_json::from_value(raw.data.object)?;
                Ok(WebhookEvent::CheckoutCompleted(session))
            }
            "payment_intent.succeeded" => {
                let intent: RawPaymentIntent = serde_json::from_value(raw.data.object)?;
                Ok(WebhookEvent::PaymentSucceeded {
                    payment_intent_id: intent.id,
                })
            }
            "payment_intent.payment_failed" => {
                let intent: RawPaymentIntent = serde_json::from_value(raw.data.object)?;
                Ok(WebhookEvent::PaymentFailed {
                    payment_intent_id: intent.id,
                })
            }
            _ => Ok(WebhookEvent::Other(raw.event_type)),
        }
    }

    /// Returns the event's wire type name, for logging and metrics.
    pub fn type_name(&self) -> &str {
        match self {
            WebhookEvent::CheckoutCompleted(_) => "checkout.session.completed",
            WebhookEvent::PaymentSucceeded { .. } => "payment_intent.succeeded",
            WebhookEvent::PaymentFailed { .. } => "payment_intent.payment_failed",
            WebhookEvent::Other(t) => t,
        }
    }
}
