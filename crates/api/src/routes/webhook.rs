//! Payment provider webhook endpoint.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use payments::WebhookEvent;

use crate::AppState;
use crate::error::ApiError;

/// POST /webhooks/payment — receives provider events.
///
/// The body is taken raw: the signature covers the exact bytes the
/// provider sent, so parsing must happen only after verification.
#[tracing::instrument(skip(state, headers, body))]
pub async fn payment<P: Send + Sync>(
    State(state): State<Arc<AppState<P>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            metrics::counter!("webhook_signature_failures_total").increment(1);
            ApiError::BadRequest("missing stripe-signature header".to_string())
        })?;

    payments::verify_signature(&body, signature, &state.webhook_secret).map_err(|e| {
        metrics::counter!("webhook_signature_failures_total").increment(1);
        ApiError::BadRequest(format!("webhook signature rejected: {e}"))
    })?;

    let event = WebhookEvent::parse(&body)
        .map_err(|e| ApiError::BadRequest(format!("unparseable webhook payload: {e}")))?;

    let handled = state.payment_events.handle(event).await?;
    tracing::info!(?handled, "webhook processed");

    Ok(Json(serde_json::json!({ "received": true })))
}
