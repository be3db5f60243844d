//! Cart payload round-tripped through the payment provider.
//!
//! The checkout initiator embeds the validated cart in the provider
//! session's metadata; the payment event handler reconstructs it from the
//! webhook. The payload is versioned so the handler can evolve without
//! breaking sessions that are still in flight.

use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::Address;

/// Current metadata schema version.
pub const METADATA_VERSION: &str = "v1";

/// One requested cart line: product plus quantity, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// The full cart payload embedded in provider session metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartMetadata {
    pub version: String,
    pub items: Vec<CartItem>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
}

/// Failure to reconstruct a cart from session metadata.
///
/// Malformed metadata on a completed session is a processing error to
/// surface, never something to drop silently.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("cart metadata missing from session")]
    Missing,

    #[error("cart metadata is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported cart metadata version: {0}")]
    Version(String),
}

impl CartMetadata {
    /// Builds a current-version payload.
    pub fn new(items: Vec<CartItem>, email: impl Into<String>, user_id: Option<UserId>) -> Self {
        Self {
            version: METADATA_VERSION.to_string(),
            items,
            email: email.into(),
            user_id,
            shipping_address: None,
            billing_address: None,
        }
    }

    /// Serializes to the JSON string stored in session metadata.
    pub fn encode(&self) -> Result<String, MetadataError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reconstructs the cart from session metadata, checking the version.
    pub fn decode(raw: &str) -> Result<Self, MetadataError> {
        let meta: CartMetadata = serde_json::from_str(raw)?;
        if meta.version != METADATA_VERSION {
            return Err(MetadataError::Version(meta.version));
        }
        Ok(meta)
    }
}
