//! Domain models for the refund portal.
//!
//! Ledger transactions and storefront orders are the normalized records the
//! collaborator clients hand to the reconciliation engine. Everything here is
//! built fresh per lookup and dropped with the response.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::ProductIdentity;
use crate::error::AppError;

// ============================================================================
// Collaborator Records
// ============================================================================

/// Status of a card-ledger payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionStatus {
    Succeeded,
    Pending,
    Failed,
    Canceled,
    Other(String),
}

impl TransactionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionStatus::Succeeded => "succeeded",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Canceled => "canceled",
            TransactionStatus::Other(status) => status,
        }
    }

    /// Failed and canceled payments never count as purchases.
    pub fn is_purchase(&self) -> bool {
        !matches!(self, TransactionStatus::Failed | TransactionStatus::Canceled)
    }
}

impl From<String> for TransactionStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "succeeded" => TransactionStatus::Succeeded,
            "pending" => TransactionStatus::Pending,
            "failed" => TransactionStatus::Failed,
            "canceled" | "cancelled" => TransactionStatus::Canceled,
            _ => TransactionStatus::Other(status),
        }
    }
}

impl From<&str> for TransactionStatus {
    fn from(status: &str) -> Self {
        TransactionStatus::from(status.to_string())
    }
}

impl From<TransactionStatus> for String {
    fn from(status: TransactionStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A payment from the card ledger. Authoritative for purchase count and amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub timestamp: DateTime<Utc>,
    pub description: Option<String>,
    /// Product name taken from invoice line items, when the ledger has one.
    pub product_name: Option<String>,
    pub sku: Option<String>,
    pub quantity: u32,
    pub has_refunds: bool,
    pub refund_amount: Decimal,
}

impl Transaction {
    /// Label fed to product resolution when no storefront line item is available.
    pub fn label(&self) -> &str {
        self.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .or(self.product_name.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or("Unknown Product")
    }
}

/// An order from the storefront. Used for enrichment only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontOrder {
    pub id: u64,
    pub number: String,
    pub status: String,
    pub date_created: DateTime<Utc>,
    /// Card-ledger payment id recorded by the storefront checkout, if any.
    pub transaction_id: Option<String>,
    pub line_items: Vec<LineItem>,
    pub billing: Billing,
    pub refunds: Vec<OrderRefund>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: u64,
    pub name: String,
    pub quantity: u32,
    pub total: Decimal,
    pub sku: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Billing {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

/// Refund recorded against a storefront order. Totals may be negative upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRefund {
    pub id: u64,
    pub total: Decimal,
}

// ============================================================================
// Reconciliation Output
// ============================================================================

/// Which commerce system a purchase was made through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Storefront,
    Crm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReference {
    /// Storefront order id; absent when synthesized from the ledger.
    pub id: Option<u64>,
    pub number: String,
    pub date: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitComponent {
    pub order_reference: OrderReference,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

/// One purchased product, derived from one ledger transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedPurchase {
    pub source_transaction_id: String,
    /// Raw upstream label the product identity was resolved from.
    pub source_label: String,
    pub product: ProductIdentity,
    pub amount: Decimal,
    pub quantity: u32,
    pub purchase_timestamp: DateTime<Utc>,
    pub origin: Origin,
    pub order_reference: OrderReference,
    pub is_refundable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_closed_reason: Option<String>,
    pub has_existing_refund: bool,
    pub is_split_payment: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_components: Option<Vec<SplitComponent>>,
}

// ============================================================================
// Request Models
// ============================================================================

/// Request body for an order lookup.
#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    #[serde(default)]
    pub email: String,
}

/// Request body for a refund submission.
///
/// Fields are optional at the serde level and checked by the submission
/// handler. Mistyped fields are rejected by the route as missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundSubmission {
    pub first_name: Option<String>,
    #[serde(alias = "productName")]
    pub canonical_product_name: Option<String>,
    pub feedback: Option<String>,
    pub is_full_refund: Option<bool>,
    pub order_reference: Option<String>,
    pub customer_email: Option<String>,
    /// Purchase total the refund amount is computed from.
    pub product_total: Option<Decimal>,
}

// ============================================================================
// Response Models
// ============================================================================

/// Response for an order lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct LookupResponse {
    pub success: bool,
    pub customer_email: String,
    /// Post-merge purchase count, derived from the ledger.
    pub total_orders: usize,
    /// Sum of purchase amounts, two decimal places.
    pub total_value: String,
    pub resolved_purchases: Vec<ResolvedPurchase>,
    /// Display list: resolved purchases with compound products expanded.
    pub products: Vec<ResolvedPurchase>,
}

/// Response for an accepted refund submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefundReceipt {
    pub success: bool,
    pub message: String,
    pub request_id: Uuid,
}

// ============================================================================
// Validation
// ============================================================================

/// Trim and validate a customer email address.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim();
    let invalid = || AppError::Validation("Please enter a valid email address".into());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    if domain.starts_with('.') || domain.ends_with('.') || !domain.contains('.') {
        return Err(invalid());
    }

    Ok(email.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert_eq!(normalize_email("  jane@example.com ").unwrap(), "jane@example.com");
        assert!(normalize_email("a.b+tag@sub.example.co").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "jane", "@example.com", "jane@", "jane@example", "a@b@c.com", "ja ne@x.com", "jane@.com"] {
            assert!(
                matches!(normalize_email(bad), Err(AppError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn status_round_trips_unknown_values() {
        let status: TransactionStatus = serde_json::from_str("\"requires_capture\"").unwrap();
        assert_eq!(status, TransactionStatus::Other("requires_capture".into()));
        assert!(status.is_purchase());
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"requires_capture\"");
        assert!(!TransactionStatus::from("canceled").is_purchase());
        assert!(!TransactionStatus::from("failed").is_purchase());
    }

    #[test]
    fn transaction_label_falls_back() {
        let mut txn = Transaction {
            id: "ch_1".into(),
            amount: Decimal::from(27),
            status: TransactionStatus::Succeeded,
            timestamp: Utc::now(),
            description: None,
            product_name: Some("Faceless Income 5-day Fast Start".into()),
            sku: None,
            quantity: 1,
            has_refunds: false,
            refund_amount: Decimal::ZERO,
        };
        assert_eq!(txn.label(), "Faceless Income 5-day Fast Start");
        txn.product_name = None;
        assert_eq!(txn.label(), "Unknown Product");
        txn.description = Some("Subscription creation".into());
        assert_eq!(txn.label(), "Subscription creation");
    }
}
