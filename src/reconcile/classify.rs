//! Origin classification and the existing-refund signal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::matcher::amounts_match;
use crate::models::{Origin, StorefrontOrder, Transaction};

/// A storefront match always wins; otherwise purchases before the CRM
/// cutover belong to the storefront.
pub fn classify_origin(matched: bool, timestamp: DateTime<Utc>, crm_cutover: DateTime<Utc>) -> Origin {
    if matched || timestamp < crm_cutover {
        Origin::Storefront
    } else {
        Origin::Crm
    }
}

/// Whether the purchase has already been refunded.
///
/// Storefront purchases look for an order-level refund equal to the purchase
/// amount. CRM purchases trust the ledger.
pub fn existing_refund(
    origin: Origin,
    transaction: &Transaction,
    matched_order: Option<&StorefrontOrder>,
    amount: Decimal,
) -> bool {
    match origin {
        Origin::Storefront => matched_order.is_some_and(|order| {
            order
                .refunds
                .iter()
                .any(|refund| amounts_match(refund.total.abs(), amount))
        }),
        Origin::Crm => transaction.has_refunds,
    }
}
