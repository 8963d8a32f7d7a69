//! Ledger transaction to storefront order matching.
//!
//! Two strategies, tried in order:
//!
//! 1. **Transaction id** - the storefront recorded the ledger payment id at checkout.
//! 2. **Amount and time** - some line item totals the transaction amount (within
//!    one cent) and the order was created within 48 hours of the payment.
//!
//! When several orders satisfy the second strategy the one closest in time
//! wins, then the lowest order id, so results never depend on upstream
//! ordering.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::models::{LineItem, StorefrontOrder, Transaction};

/// Amounts closer than this are the same amount.
pub const AMOUNT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Orders further than this from the payment are never fuzzy matches.
pub fn match_window() -> Duration {
    Duration::hours(48)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    TransactionId,
    AmountAndTime,
}

#[derive(Debug, Clone, Copy)]
pub struct OrderMatch<'a> {
    pub order: &'a StorefrontOrder,
    pub kind: MatchKind,
}

pub fn amounts_match(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < AMOUNT_TOLERANCE
}

/// First line item whose total equals `amount`.
pub fn matching_line_item(order: &StorefrontOrder, amount: Decimal) -> Option<&LineItem> {
    order
        .line_items
        .iter()
        .find(|item| amounts_match(item.total, amount))
}

fn time_delta(order: &StorefrontOrder, at: DateTime<Utc>) -> Duration {
    (order.date_created - at).abs()
}

pub fn find_matching_order<'a>(
    transaction: &Transaction,
    orders: &'a [StorefrontOrder],
) -> Option<OrderMatch<'a>> {
    if let Some(order) = orders
        .iter()
        .find(|o| o.transaction_id.as_deref() == Some(transaction.id.as_str()))
    {
        return Some(OrderMatch {
            order,
            kind: MatchKind::TransactionId,
        });
    }

    let window = match_window();
    orders
        .iter()
        .filter(|o| matching_line_item(o, transaction.amount).is_some())
        .filter(|o| time_delta(o, transaction.timestamp) < window)
        .min_by_key(|o| (time_delta(o, transaction.timestamp), o.id))
        .map(|order| OrderMatch {
            order,
            kind: MatchKind::AmountAndTime,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Billing, TransactionStatus};
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap()
    }

    fn txn(id: &str, amount: i64, timestamp: DateTime<Utc>) -> Transaction {
        Transaction {
            id: id.into(),
            amount: Decimal::from(amount),
            status: TransactionStatus::Succeeded,
            timestamp,
            description: None,
            product_name: None,
            sku: None,
            quantity: 1,
            has_refunds: false,
            refund_amount: Decimal::ZERO,
        }
    }

    fn order(id: u64, created: DateTime<Utc>, totals: &[&str]) -> StorefrontOrder {
        StorefrontOrder {
            id,
            number: id.to_string(),
            status: "completed".into(),
            date_created: created,
            transaction_id: None,
            line_items: totals
                .iter()
                .enumerate()
                .map(|(i, total)| LineItem {
                    product_id: i as u64,
                    name: format!("item {i}"),
                    quantity: 1,
                    total: total.parse().unwrap(),
                    sku: None,
                })
                .collect(),
            billing: Billing::default(),
            refunds: Vec::new(),
        }
    }

    #[test]
    fn transaction_id_wins_over_fuzzy_candidates() {
        let t = txn("ch_1", 147, at(10, 12));
        let mut recorded = order(2, at(20, 0), &["1.00"]);
        recorded.transaction_id = Some("ch_1".into());
        let orders = vec![order(1, at(10, 12), &["147.00"]), recorded];

        let m = find_matching_order(&t, &orders).unwrap();
        assert_eq!(m.order.id, 2);
        assert_eq!(m.kind, MatchKind::TransactionId);
    }

    #[test]
    fn fuzzy_match_needs_amount_and_window() {
        let t = txn("ch_1", 147, at(10, 12));

        let wrong_amount = vec![order(1, at(10, 12), &["97.00"])];
        assert!(find_matching_order(&t, &wrong_amount).is_none());

        let too_far = vec![order(1, at(12, 12), &["147.00"])];
        assert!(find_matching_order(&t, &too_far).is_none());

        let within = vec![order(1, at(12, 11), &["27.00", "147.00"])];
        let m = find_matching_order(&t, &within).unwrap();
        assert_eq!(m.kind, MatchKind::AmountAndTime);
    }

    #[test]
    fn amount_tolerance_is_under_one_cent() {
        assert!(amounts_match(Decimal::new(14700, 2), Decimal::new(147005, 3)));
        assert!(!amounts_match(Decimal::new(14700, 2), Decimal::new(14701, 2)));
    }

    #[test]
    fn closest_candidate_wins_then_lowest_id() {
        let t = txn("ch_1", 27, at(10, 12));
        let orders = vec![
            order(9, at(11, 6), &["27.00"]),
            order(7, at(10, 14), &["27.00"]),
            order(5, at(10, 10), &["27.00"]),
        ];

        // orders 7 and 5 are both two hours away
        let m = find_matching_order(&t, &orders).unwrap();
        assert_eq!(m.order.id, 5);
    }

    #[test]
    fn line_item_lookup_uses_amount() {
        let o = order(1, at(10, 12), &["27.00", "47.00"]);
        assert_eq!(matching_line_item(&o, Decimal::from(47)).unwrap().name, "item 1");
        assert!(matching_line_item(&o, Decimal::from(74)).is_none());
    }
}
