use std::time::Duration;

use log::*;
use sf_common::Secret;

pub const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    /// The API root, without a trailing slash. Overridable so that test and staging setups can point at a stub.
    pub base_url: String,
    pub secret_key: Secret<String>,
    /// Where Paystack redirects the shopper after checkout. When absent, the dashboard default is used.
    pub callback_url: Option<String>,
    pub timeout: Duration,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PAYSTACK_BASE_URL.to_string(),
            secret_key: Secret::default(),
            callback_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl PaystackConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("SF_PAYSTACK_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| {
                info!("SF_PAYSTACK_BASE_URL not set, using {DEFAULT_PAYSTACK_BASE_URL}");
                DEFAULT_PAYSTACK_BASE_URL.to_string()
            });
        let secret_key = Secret::new(std::env::var("SF_PAYSTACK_SECRET_KEY").unwrap_or_else(|_| {
            error!(
                "SF_PAYSTACK_SECRET_KEY not set. Payment initialization will fail and every webhook will be rejected."
            );
            String::default()
        }));
        let callback_url = std::env::var("SF_PAYSTACK_CALLBACK_URL").ok().filter(|s| !s.trim().is_empty());
        let timeout = std::env::var("SF_PAYSTACK_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Invalid SF_PAYSTACK_TIMEOUT_SECS value '{s}'. {e}. Using the default."))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Self { base_url, secret_key, callback_url, timeout }
    }
}
