use std::time::Duration;

use log::*;
use settle_common::{helpers::parse_env, Secret};

const DEFAULT_BASE_URL: &str = "https://api.paystack.co";
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 500;
const DEFAULT_CURRENCY: &str = "NGN";

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub base_url: String,
    pub secret_key: Secret<String>,
    /// The currency code used when creating transfer recipients and listing banks
    pub currency: String,
    /// Where the customer is sent after completing a hosted checkout. Optional.
    pub callback_url: Option<String>,
    /// Total number of attempts (including the first) for requests that fail with a retryable status
    pub max_attempts: u32,
    /// The backoff unit. Attempt `n` waits `n * retry_delay` before the next one.
    pub retry_delay: Duration,
    /// How long the bank list is kept before it is fetched again
    pub bank_cache_ttl: chrono::Duration,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            secret_key: Secret::default(),
            currency: DEFAULT_CURRENCY.to_string(),
            callback_url: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            bank_cache_ttl: chrono::Duration::hours(24),
        }
    }
}

impl PaystackConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("TSS_PAYSTACK_BASE_URL").unwrap_or_else(|_| {
            info!("TSS_PAYSTACK_BASE_URL not set, using {DEFAULT_BASE_URL}");
            DEFAULT_BASE_URL.to_string()
        });
        let secret_key = Secret::from_env("TSS_PAYSTACK_SECRET_KEY").unwrap_or_else(|| {
            warn!("TSS_PAYSTACK_SECRET_KEY not set. Every gateway call will be rejected.");
            Secret::default()
        });
        let currency = std::env::var("TSS_PAYSTACK_CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY.to_string());
        let callback_url = std::env::var("TSS_PAYSTACK_CALLBACK_URL").ok();
        let max_attempts = match parse_env::<u32>("TSS_PAYSTACK_MAX_ATTEMPTS") {
            Some(Ok(n)) if n > 0 => n,
            Some(Ok(_)) => {
                warn!("TSS_PAYSTACK_MAX_ATTEMPTS must be at least 1. Using {DEFAULT_MAX_ATTEMPTS}");
                DEFAULT_MAX_ATTEMPTS
            },
            Some(Err(e)) => {
                warn!("{e}. Using {DEFAULT_MAX_ATTEMPTS}");
                DEFAULT_MAX_ATTEMPTS
            },
            None => DEFAULT_MAX_ATTEMPTS,
        };
        let retry_delay_ms = match parse_env::<u64>("TSS_PAYSTACK_RETRY_DELAY_MS") {
            Some(Ok(ms)) => ms,
            Some(Err(e)) => {
                warn!("{e}. Using {DEFAULT_RETRY_DELAY_MS}ms");
                DEFAULT_RETRY_DELAY_MS
            },
            None => DEFAULT_RETRY_DELAY_MS,
        };
        Self {
            base_url,
            secret_key,
            currency,
            callback_url,
            max_attempts,
            retry_delay: Duration::from_millis(retry_delay_ms),
            ..Default::default()
        }
    }
}
