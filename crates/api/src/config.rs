//! Application configuration loaded from environment variables.

use checkout::CheckoutConfig;
use domain::Money;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `DATA_DIR` — directory for the JSON collections (default: `"data"`)
/// - `CURRENCY` — lowercase ISO code for sessions (default: `"gbp"`)
/// - `FREE_SHIPPING_THRESHOLD` — minor units (default: `5000`)
/// - `STANDARD_SHIPPING` — minor units (default: `450`)
/// - `STRIPE_SECRET_KEY` — provider API key
/// - `STRIPE_WEBHOOK_SECRET` — endpoint secret for signature checks
/// - `JWT_SECRET` — bearer-token verification key
/// - `CHECKOUT_SUCCESS_URL` / `CHECKOUT_CANCEL_URL` — redirect targets
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: String,
    pub currency: String,
    pub free_shipping_threshold: Money,
    pub standard_shipping: Money,
    pub stripe_secret_key: String,
    pub webhook_secret: String,
    pub jwt_secret: String,
    pub success_url: String,
    pub cancel_url: String,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_minor_or(name: &str, default: i64) -> Money {
    Money::from_minor(
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default),
    )
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            data_dir: env_or("DATA_DIR", "data"),
            currency: env_or("CURRENCY", "gbp"),
            free_shipping_threshold: env_minor_or("FREE_SHIPPING_THRESHOLD", 5000),
            standard_shipping: env_minor_or("STANDARD_SHIPPING", 450),
            stripe_secret_key: env_or("STRIPE_SECRET_KEY", ""),
            webhook_secret: env_or("STRIPE_WEBHOOK_SECRET", ""),
            jwt_secret: env_or("JWT_SECRET", ""),
            success_url: env_or(
                "CHECKOUT_SUCCESS_URL",
                "http://localhost:3000/checkout/success",
            ),
            cancel_url: env_or("CHECKOUT_CANCEL_URL", "http://localhost:3000/checkout/cancel"),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Extracts the checkout pricing settings.
    pub fn checkout(&self) -> CheckoutConfig {
        CheckoutConfig {
            currency: self.currency.clone(),
            free_shipping_threshold: self.free_shipping_threshold,
            standard_shipping: self.standard_shipping,
            success_url: self.success_url.clone(),
            cancel_url: self.cancel_url.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            data_dir: "data".to_string(),
            currency: "gbp".to_string(),
            free_shipping_threshold: Money::from_minor(5000),
            standard_shipping: Money::from_minor(450),
            stripe_secret_key: String::new(),
            webhook_secret: String::new(),
            jwt_secret: String::new(),
            success_url: "http://localhost:3000/checkout/success".to_string(),
            cancel_url: "http://localhost:3000/checkout/cancel".to_string(),
        }
    }
}
