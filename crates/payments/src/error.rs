use thiserror::Error;

/// Errors from payment provider calls.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The HTTP request to the provider failed.
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider responded but the response was not what we expected.
    #[error("provider error: {0}")]
    Provider(String),

    /// The webhook payload could not be decoded.
    #[error("webhook payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Webhook signature verification failures.
///
/// These map to a 400 at the HTTP boundary; the provider will not retry a
/// request it considers accepted, so a bad signature must be rejected
/// before any processing happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed signature header")]
    MalformedHeader,

    #[error("signature is not valid hex")]
    InvalidHex,

    #[error("signature mismatch")]
    Mismatch,

    #[error("timestamp outside tolerance window")]
    Expired,
}
