//! Post-processing passes over the resolved purchase list.
//!
//! Each pass is a hard-coded business exception applied after the main
//! resolution loop:
//!
//! - [`merge_split_payments`] folds the two installments of the discounted
//!   Launchpad offer into one purchase.
//! - [`expand_compound_products`] breaks the Fast-Start + Endless Video Ideas
//!   bundle charge into its two constituent products.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::catalog::{is_split_pay_label, CanonicalProduct, ProductIdentity};
use crate::eligibility;
use crate::models::{ResolvedPurchase, SplitComponent};

fn installment_gap() -> (Duration, Duration) {
    (Duration::days(25), Duration::days(35))
}

// ============================================================================
// Split-Payment Merger
// ============================================================================

/// Merge the two installments of a split-pay purchase.
///
/// Only applies when exactly two installments exist and they are 25 to 35
/// days apart (inclusive). The merged entry takes the earlier installment's
/// place in the list and keeps its identity, date and refund state.
pub fn merge_split_payments(mut purchases: Vec<ResolvedPurchase>) -> Vec<ResolvedPurchase> {
    let installments: Vec<usize> = purchases
        .iter()
        .enumerate()
        .filter(|(_, p)| is_split_pay_label(&p.source_label))
        .map(|(i, _)| i)
        .collect();

    let [a, b] = installments[..] else {
        if !installments.is_empty() {
            debug!("{} split-pay installments found, leaving unmerged", installments.len());
        }
        return purchases;
    };

    let (earlier, later) = if purchases[b].purchase_timestamp < purchases[a].purchase_timestamp {
        (b, a)
    } else {
        (a, b)
    };

    let gap = purchases[later].purchase_timestamp - purchases[earlier].purchase_timestamp;
    let (min_gap, max_gap) = installment_gap();
    if gap < min_gap || gap > max_gap {
        debug!("Split-pay installments are {} days apart, leaving unmerged", gap.num_days());
        return purchases;
    }

    let second = purchases.remove(later);
    // removing `later` shifts `earlier` only when it came after it
    let first_index = if earlier > later { earlier - 1 } else { earlier };
    let first = &mut purchases[first_index];

    first.split_components = Some(vec![component(first), component(&second)]);
    first.amount += second.amount;
    first.is_split_payment = true;

    debug!(
        "Merged split-pay installments {} and {} into {}",
        first.source_transaction_id, second.source_transaction_id, first.amount
    );
    purchases
}

fn component(purchase: &ResolvedPurchase) -> SplitComponent {
    SplitComponent {
        order_reference: purchase.order_reference.clone(),
        amount: purchase.amount,
        date: purchase.purchase_timestamp,
    }
}

// ============================================================================
// Compound-Product Splitter
// ============================================================================

/// Expand compound purchases into one entry per constituent product.
///
/// Each constituent inherits the parent's date, origin, order reference and
/// existing-refund flag; eligibility is recomputed for the constituent's own
/// refund window. Constituents are keyed `{transaction}-{n}` so every display
/// row stays unique.
pub fn expand_compound_products(purchases: &[ResolvedPurchase], now: DateTime<Utc>) -> Vec<ResolvedPurchase> {
    let mut expanded = Vec::with_capacity(purchases.len());

    for purchase in purchases {
        let Some(parts) = purchase.product.canonical().and_then(CanonicalProduct::constituents) else {
            expanded.push(purchase.clone());
            continue;
        };

        for (part, (product, price)) in parts.into_iter().enumerate() {
            let product = ProductIdentity::from(product);
            let verdict = eligibility::assess(&product, purchase.purchase_timestamp, now);
            expanded.push(ResolvedPurchase {
                source_transaction_id: format!("{}-{}", purchase.source_transaction_id, part + 1),
                product,
                amount: price,
                is_refundable: verdict.refundable,
                refund_closed_reason: verdict.reason.map(String::from),
                ..purchase.clone()
            });
        }
    }

    expanded
}
