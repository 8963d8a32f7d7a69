//! Environment-driven configuration.
//!
//! Missing collaborator credentials are not a startup error. They leave the
//! corresponding settings empty and surface per request instead.

use std::env;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct StripeSettings {
    pub secret_key: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct StorefrontSettings {
    pub store_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
}

#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub server_token: String,
    pub from: String,
    pub support_inbox: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub stripe: Option<StripeSettings>,
    pub storefront: Option<StorefrontSettings>,
    pub email: Option<EmailSettings>,
    /// Purchases before this instant predate the CRM and belong to the storefront.
    pub crm_cutover: DateTime<Utc>,
    pub upstream_timeout: Duration,
    pub database_url: Option<String>,
}

pub fn default_crm_cutover() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 8, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let var_or_alias = |key: &str, alias: &str| var(key).or_else(|| var(alias));

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = var("PORT").and_then(|p| p.parse().ok()).unwrap_or(3000);

        let stripe = var("STRIPE_SECRET_KEY").map(|secret_key| StripeSettings {
            secret_key,
            api_base: var("STRIPE_API_BASE").unwrap_or_else(|| "https://api.stripe.com".to_string()),
        });

        let storefront = match (
            var_or_alias("WOOCOMMERCE_STORE_URL", "STORE_URL"),
            var_or_alias("WOOCOMMERCE_CONSUMER_KEY", "CONSUMER_KEY"),
            var_or_alias("WOOCOMMERCE_CONSUMER_SECRET", "CONSUMER_SECRET"),
        ) {
            (Some(store_url), Some(consumer_key), Some(consumer_secret)) => Some(StorefrontSettings {
                store_url,
                consumer_key,
                consumer_secret,
            }),
            _ => None,
        };

        let email = var("POSTMARK_API_KEY").map(|server_token| EmailSettings {
            server_token,
            from: var("REFUND_NOTIFY_FROM").unwrap_or_else(|| "noreply@viralprofits.yt".to_string()),
            support_inbox: var("REFUND_NOTIFY_TO").unwrap_or_else(|| "hello@viralprofits.yt".to_string()),
        });

        let crm_cutover = match var("CRM_CUTOVER_AT") {
            Some(raw) => match DateTime::parse_from_rfc3339(&raw) {
                Ok(dt) => dt.with_timezone(&Utc),
                Err(e) => {
                    warn!("Ignoring invalid CRM_CUTOVER_AT '{}': {}", raw, e);
                    default_crm_cutover()
                }
            },
            None => default_crm_cutover(),
        };

        let upstream_timeout = Duration::from_secs(
            var("UPSTREAM_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(15),
        );

        Self {
            host,
            port,
            stripe,
            storefront,
            email,
            crm_cutover,
            upstream_timeout,
            database_url: var("APP_DATABASE_URL"),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
