//! Storefront client backed by the WooCommerce REST API (`wc/v3`).
//!
//! Orders are validated on the way in: a line item whose total does not
//! parse is dropped, and an order without a usable creation date is skipped.
//! Both are logged rather than failing the lookup.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

use super::{status_error, ClientError, StorefrontClient};
use crate::config::StorefrontSettings;
use crate::models::{Billing, LineItem, OrderRefund, StorefrontOrder};

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct WooOrder {
    id: u64,
    #[serde(default)]
    number: String,
    status: String,
    date_created: Option<String>,
    date_created_gmt: Option<String>,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    billing: WooBilling,
    #[serde(default)]
    line_items: Vec<WooLineItem>,
    #[serde(default)]
    refunds: Vec<WooRefund>,
}

#[derive(Debug, Default, Deserialize)]
struct WooBilling {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WooLineItem {
    #[serde(default)]
    product_id: u64,
    name: String,
    #[serde(default)]
    quantity: i64,
    total: String,
    sku: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WooRefund {
    id: u64,
    total: String,
}

// ============================================================================
// Client
// ============================================================================

#[derive(Debug, Clone)]
pub struct WooCommerceClient {
    client: Client,
    store_url: String,
    consumer_key: String,
    consumer_secret: String,
}

impl WooCommerceClient {
    pub fn new(client: Client, settings: &StorefrontSettings) -> Self {
        Self {
            client,
            store_url: settings.store_url.trim_end_matches('/').to_string(),
            consumer_key: settings.consumer_key.clone(),
            consumer_secret: settings.consumer_secret.clone(),
        }
    }

    async fn fetch_orders(&self, query: &[(&str, &str)]) -> Result<Vec<WooOrder>, ClientError> {
        let response = self
            .client
            .get(format!("{}/wp-json/wc/v3/orders", self.store_url))
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl StorefrontClient for WooCommerceClient {
    async fn list_orders(&self, email: &str) -> Result<Vec<StorefrontOrder>, ClientError> {
        let raw = self
            .fetch_orders(&[("search", email), ("per_page", "100"), ("status", "any")])
            .await?;

        let orders: Vec<StorefrontOrder> = raw.into_iter().filter_map(into_order).collect();
        info!("Found {} storefront orders for {}", orders.len(), email);
        Ok(orders)
    }

    async fn check_connection(&self) -> Result<(), ClientError> {
        self.fetch_orders(&[("per_page", "1")]).await.map(|_| ())
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Parse a storefront timestamp. The GMT field is preferred; both are
/// timezone-less and treated as UTC.
fn parse_date(order: &WooOrder) -> Option<DateTime<Utc>> {
    [order.date_created_gmt.as_deref(), order.date_created.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                        .ok()
                        .map(|naive| naive.and_utc())
                })
        })
}

fn parse_money(raw: &str) -> Option<Decimal> {
    raw.trim().parse::<Decimal>().ok()
}

fn into_order(order: WooOrder) -> Option<StorefrontOrder> {
    let Some(date_created) = parse_date(&order) else {
        warn!("Skipping storefront order {}: missing or invalid creation date", order.id);
        return None;
    };

    let line_items = order
        .line_items
        .into_iter()
        .filter_map(|item| match parse_money(&item.total) {
            Some(total) => Some(LineItem {
                product_id: item.product_id,
                name: item.name,
                quantity: u32::try_from(item.quantity).unwrap_or(0),
                total,
                sku: item.sku.filter(|s| !s.is_empty()),
            }),
            None => {
                warn!(
                    "Dropping line item '{}' on order {}: invalid total '{}'",
                    item.name, order.id, item.total
                );
                None
            }
        })
        .collect();

    let refunds = order
        .refunds
        .into_iter()
        .filter_map(|r| parse_money(&r.total).map(|total| OrderRefund { id: r.id, total }))
        .collect();

    Some(StorefrontOrder {
        id: order.id,
        number: if order.number.is_empty() { order.id.to_string() } else { order.number },
        status: order.status,
        date_created,
        transaction_id: order.transaction_id.filter(|t| !t.is_empty()),
        line_items,
        billing: Billing {
            first_name: order.billing.first_name,
            last_name: order.billing.last_name,
            email: order.billing.email,
        },
        refunds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn woo(value: serde_json::Value) -> WooOrder {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn converts_typical_order() {
        let order = into_order(woo(json!({
            "id": 4411,
            "number": "4411",
            "status": "completed",
            "date_created": "2025-06-01T03:15:00",
            "date_created_gmt": "2025-06-01T10:15:00",
            "transaction_id": "",
            "billing": { "first_name": "Jane", "last_name": "Doe", "email": "jane@example.com" },
            "line_items": [
                { "product_id": 12, "name": "7-Figure Launchpad", "quantity": 1, "total": "147.00", "sku": "" }
            ],
            "refunds": [ { "id": 9, "total": "-147.00" } ]
        })))
        .unwrap();

        assert_eq!(order.date_created, Utc.with_ymd_and_hms(2025, 6, 1, 10, 15, 0).unwrap());
        assert_eq!(order.transaction_id, None);
        assert_eq!(order.line_items.len(), 1);
        assert_eq!(order.line_items[0].total, Decimal::new(147, 0));
        assert_eq!(order.line_items[0].sku, None);
        assert_eq!(order.refunds[0].total, Decimal::new(-147, 0));
        assert_eq!(order.billing.first_name, "Jane");
    }

    #[test]
    fn malformed_line_item_is_dropped() {
        let order = into_order(woo(json!({
            "id": 1,
            "number": "1",
            "status": "processing",
            "date_created": "2025-06-01T10:15:00",
            "line_items": [
                { "name": "Broken", "total": "n/a" },
                { "name": "Channel Brand Kit", "quantity": 1, "total": "97.00" }
            ]
        })))
        .unwrap();

        assert_eq!(order.line_items.len(), 1);
        assert_eq!(order.line_items[0].name, "Channel Brand Kit");
    }

    #[test]
    fn order_without_date_is_skipped() {
        let order = woo(json!({ "id": 2, "status": "completed", "date_created": "yesterday" }));
        assert!(into_order(order).is_none());
    }

    #[test]
    fn missing_number_falls_back_to_id() {
        let order = into_order(woo(json!({
            "id": 77,
            "status": "completed",
            "date_created": "2025-06-01T10:15:00Z",
            "transaction_id": "ch_123"
        })))
        .unwrap();
        assert_eq!(order.number, "77");
        assert_eq!(order.transaction_id.as_deref(), Some("ch_123"));
    }
}
