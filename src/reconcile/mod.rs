//! # Order Reconciliation
//!
//! Merges a customer's card-ledger transactions with their storefront orders
//! into one resolved purchase per successful ledger transaction.
//!
//! ## Pipeline
//!
//! 1. Fetch ledger transactions. The ledger is authoritative: a failure aborts
//!    the lookup, and an empty ledger returns immediately.
//! 2. Drop failed and canceled payments.
//! 3. Fetch storefront orders. Enrichment only; a failed fetch degrades to no orders.
//! 4. Per transaction: match an order ([`matcher`]), classify origin
//!    ([`classify`]), resolve the product, assess eligibility.
//! 5. Post-processing [`passes`]: split-payment merge, then compound expansion
//!    for the display list.

pub mod classify;
pub mod matcher;
pub mod passes;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::catalog;
use crate::clients::{ClientError, LedgerClient, StorefrontClient};
use crate::eligibility;
use crate::error::{AppError, Result};
use crate::models::{
    normalize_email, LookupResponse, OrderReference, ResolvedPurchase, StorefrontOrder, Transaction,
    TransactionStatus,
};

use self::classify::{classify_origin, existing_refund};
use self::matcher::{find_matching_order, matching_line_item};

/// Output of one reconciliation run.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub customer_email: String,
    /// One entry per successful ledger transaction, after split-pay merging.
    pub resolved_purchases: Vec<ResolvedPurchase>,
    /// `resolved_purchases` with compound products expanded.
    pub products: Vec<ResolvedPurchase>,
}

impl Reconciliation {
    fn empty(customer_email: String) -> Self {
        Self {
            customer_email,
            resolved_purchases: Vec::new(),
            products: Vec::new(),
        }
    }

    pub fn total_orders(&self) -> usize {
        self.resolved_purchases.len()
    }

    pub fn total_value(&self) -> Decimal {
        self.resolved_purchases.iter().map(|p| p.amount).sum()
    }
}

impl From<Reconciliation> for LookupResponse {
    fn from(rec: Reconciliation) -> Self {
        LookupResponse {
            success: true,
            total_orders: rec.total_orders(),
            total_value: format!("{:.2}", rec.total_value()),
            customer_email: rec.customer_email,
            resolved_purchases: rec.resolved_purchases,
            products: rec.products,
        }
    }
}

#[derive(Clone)]
pub struct ReconciliationEngine {
    ledger: Arc<dyn LedgerClient>,
    storefront: Arc<dyn StorefrontClient>,
    crm_cutover: DateTime<Utc>,
}

impl ReconciliationEngine {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        storefront: Arc<dyn StorefrontClient>,
        crm_cutover: DateTime<Utc>,
    ) -> Self {
        Self {
            ledger,
            storefront,
            crm_cutover,
        }
    }

    pub async fn reconcile(&self, email: &str) -> Result<Reconciliation> {
        self.reconcile_at(email, Utc::now()).await
    }

    /// Reconcile with an explicit "now" for eligibility.
    pub async fn reconcile_at(&self, email: &str, now: DateTime<Utc>) -> Result<Reconciliation> {
        let email = normalize_email(email)?;

        let all_transactions = self
            .ledger
            .list_transactions(&email)
            .await
            .map_err(ledger_error)?;
        info!("Found {} ledger transactions for {}", all_transactions.len(), email);

        let transactions: Vec<Transaction> = all_transactions
            .into_iter()
            .filter(|t| t.status.is_purchase())
            .collect();
        info!("Filtered to {} successful ledger transactions", transactions.len());

        if transactions.is_empty() {
            info!("No ledger purchases for {}, returning empty result", email);
            return Ok(Reconciliation::empty(email));
        }

        let orders = self.storefront_orders(&email).await?;

        let resolved: Vec<ResolvedPurchase> = transactions
            .iter()
            .map(|txn| self.resolve_transaction(txn, &orders, now))
            .collect();
        info!(
            "Resolved {} purchases from {} ledger transactions",
            resolved.len(),
            transactions.len()
        );

        let resolved_purchases = passes::merge_split_payments(resolved);
        let products = passes::expand_compound_products(&resolved_purchases, now);

        Ok(Reconciliation {
            customer_email: email,
            resolved_purchases,
            products,
        })
    }

    /// Missing credentials are fatal; any other storefront failure degrades
    /// to an empty order list.
    async fn storefront_orders(&self, email: &str) -> Result<Vec<StorefrontOrder>> {
        match self.storefront.list_orders(email).await {
            Ok(orders) => {
                info!("Found {} storefront orders for {}", orders.len(), email);
                Ok(orders)
            }
            Err(ClientError::NotConfigured(collaborator)) => Err(AppError::Configuration(collaborator)),
            Err(e) => {
                warn!("Storefront lookup failed, continuing with ledger data only: {}", e);
                Ok(Vec::new())
            }
        }
    }

    fn resolve_transaction(
        &self,
        txn: &Transaction,
        orders: &[StorefrontOrder],
        now: DateTime<Utc>,
    ) -> ResolvedPurchase {
        let matched = find_matching_order(txn, orders).map(|m| m.order);
        let origin = classify_origin(matched.is_some(), txn.timestamp, self.crm_cutover);

        // storefront line items disambiguate same-priced products
        let line_item = matched.and_then(|order| matching_line_item(order, txn.amount));
        let source_label = line_item
            .map(|item| item.name.as_str())
            .unwrap_or_else(|| txn.label())
            .to_string();

        let product = catalog::resolve(&source_label, Some(txn.amount), Some(origin));

        let order_reference = match matched {
            Some(order) => OrderReference {
                id: Some(order.id),
                number: order.number.clone(),
                date: order.date_created,
                status: order.status.clone(),
            },
            None => synthesized_reference(txn),
        };

        let purchase_timestamp = order_reference.date;
        let verdict = eligibility::assess(&product, purchase_timestamp, now);

        debug!(
            "Transaction {} (${}): origin={:?} label={:?} product={:?} refundable={}",
            txn.id, txn.amount, origin, source_label, product.name(), verdict.refundable
        );

        ResolvedPurchase {
            source_transaction_id: txn.id.clone(),
            has_existing_refund: existing_refund(origin, txn, matched, txn.amount),
            source_label,
            product,
            amount: txn.amount,
            quantity: txn.quantity.max(1),
            purchase_timestamp,
            origin,
            order_reference,
            is_refundable: verdict.refundable,
            refund_closed_reason: verdict.reason.map(String::from),
            is_split_payment: false,
            split_components: None,
        }
    }
}

fn synthesized_reference(txn: &Transaction) -> OrderReference {
    let status = match &txn.status {
        TransactionStatus::Succeeded => "completed".to_string(),
        other => other.as_str().to_string(),
    };
    OrderReference {
        id: None,
        number: txn.id.clone(),
        date: txn.timestamp,
        status,
    }
}

fn ledger_error(err: ClientError) -> AppError {
    match err {
        ClientError::NotConfigured(collaborator) => AppError::Configuration(collaborator),
        other => AppError::LedgerUnavailable(other.to_string()),
    }
}
