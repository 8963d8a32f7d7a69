//! Card-ledger client backed by the Stripe REST API.
//!
//! A customer's ledger is every charge plus every payment intent that has not
//! produced one of those charges. Amounts arrive in minor units and are
//! normalized to decimals here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

use super::{status_error, ClientError, LedgerClient};
use crate::config::StripeSettings;
use crate::models::{Transaction, TransactionStatus};

const PAGE_LIMIT: &str = "100";

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct List<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Customer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Charge {
    id: String,
    amount: i64,
    #[serde(default)]
    amount_refunded: i64,
    status: String,
    created: i64,
    description: Option<String>,
    #[serde(default)]
    refunded: bool,
    refunds: Option<List<Refund>>,
    invoice: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Refund {
    #[allow(dead_code)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct PaymentIntent {
    id: String,
    amount: i64,
    status: String,
    created: i64,
    description: Option<String>,
    latest_charge: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Invoice {
    lines: List<InvoiceLine>,
}

#[derive(Debug, Deserialize)]
struct InvoiceLine {
    quantity: Option<u32>,
    price: Option<InvoicePrice>,
}

#[derive(Debug, Deserialize)]
struct InvoicePrice {
    product: Option<serde_json::Value>,
}

/// Product detail recovered from a charge's invoice.
#[derive(Debug, Default)]
struct InvoiceHint {
    product_name: Option<String>,
    quantity: Option<u32>,
}

// ============================================================================
// Client
// ============================================================================

#[derive(Debug, Clone)]
pub struct StripeLedgerClient {
    client: Client,
    secret_key: String,
    api_base: String,
}

impl StripeLedgerClient {
    pub fn new(client: Client, settings: &StripeSettings) -> Self {
        Self {
            client,
            secret_key: settings.secret_key.clone(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
        }
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let response = self
            .client
            .get(format!("{}{}", self.api_base, path))
            .basic_auth(&self.secret_key, None::<&str>)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        Ok(response.json().await?)
    }

    async fn find_customer(&self, email: &str) -> Result<Option<Customer>, ClientError> {
        let customers: List<Customer> = self
            .get("/v1/customers", &[("email", email), ("limit", "1")])
            .await?;
        Ok(customers.data.into_iter().next())
    }

    /// Invoice lookups are best-effort; a failure only loses the product hint.
    async fn invoice_hint(&self, invoice_id: &str) -> InvoiceHint {
        let path = format!("/v1/invoices/{}", invoice_id);
        match self
            .get::<Invoice>(&path, &[("expand[]", "lines.data.price.product")])
            .await
        {
            Ok(invoice) => hint_from_invoice(invoice),
            Err(e) => {
                debug!("Could not fetch invoice {}: {}", invoice_id, e);
                InvoiceHint::default()
            }
        }
    }
}

#[async_trait]
impl LedgerClient for StripeLedgerClient {
    async fn list_transactions(&self, email: &str) -> Result<Vec<Transaction>, ClientError> {
        let Some(customer) = self.find_customer(email).await? else {
            info!("No ledger customer found for {}", email);
            return Ok(Vec::new());
        };

        let charges: List<Charge> = self
            .get(
                "/v1/charges",
                &[
                    ("customer", customer.id.as_str()),
                    ("limit", PAGE_LIMIT),
                    ("expand[]", "data.refunds"),
                ],
            )
            .await?;

        let intents: List<PaymentIntent> = self
            .get(
                "/v1/payment_intents",
                &[("customer", customer.id.as_str()), ("limit", PAGE_LIMIT)],
            )
            .await?;

        let mut transactions = Vec::with_capacity(charges.data.len() + intents.data.len());
        for charge in &charges.data {
            let hint = match charge.invoice.as_deref() {
                Some(invoice_id) => self.invoice_hint(invoice_id).await,
                None => InvoiceHint::default(),
            };
            transactions.push(charge_to_transaction(charge, hint)?);
        }

        for intent in intents.data {
            if intent
                .latest_charge
                .as_ref()
                .is_some_and(|c| transactions.iter().any(|t| &t.id == c))
            {
                continue;
            }

            let latest_charge = match intent.latest_charge.as_deref() {
                Some(charge_id) => {
                    let path = format!("/v1/charges/{}", charge_id);
                    match self.get::<Charge>(&path, &[("expand[]", "refunds")]).await {
                        Ok(charge) => Some(charge),
                        Err(e) => {
                            debug!("Could not fetch charge {}: {}", charge_id, e);
                            None
                        }
                    }
                }
                None => None,
            };
            transactions.push(intent_to_transaction(&intent, latest_charge.as_ref())?);
        }

        info!(
            "Fetched {} ledger transactions for customer {}",
            transactions.len(),
            customer.id
        );
        Ok(transactions)
    }
}

// ============================================================================
// Normalization
// ============================================================================

fn minor_units(amount: i64) -> Decimal {
    Decimal::new(amount, 2)
}

fn timestamp(id: &str, created: i64) -> Result<DateTime<Utc>, ClientError> {
    DateTime::from_timestamp(created, 0)
        .ok_or_else(|| ClientError::Decode(format!("{}: invalid created timestamp {}", id, created)))
}

fn charge_has_refunds(charge: &Charge) -> bool {
    charge.refunded || charge.refunds.as_ref().is_some_and(|r| !r.data.is_empty())
}

fn hint_from_invoice(invoice: Invoice) -> InvoiceHint {
    let Some(line) = invoice.lines.data.into_iter().next() else {
        return InvoiceHint::default();
    };

    // `product` is an object only when expanded; otherwise it is a bare id
    let product_name = line
        .price
        .and_then(|p| p.product)
        .and_then(|p| p.get("name").and_then(|n| n.as_str()).map(String::from));

    InvoiceHint {
        product_name,
        quantity: line.quantity,
    }
}

fn charge_to_transaction(charge: &Charge, hint: InvoiceHint) -> Result<Transaction, ClientError> {
    Ok(Transaction {
        id: charge.id.clone(),
        amount: minor_units(charge.amount),
        status: TransactionStatus::from(charge.status.as_str()),
        timestamp: timestamp(&charge.id, charge.created)?,
        description: charge.description.clone(),
        product_name: hint.product_name,
        sku: None,
        quantity: hint.quantity.unwrap_or(1).max(1),
        has_refunds: charge_has_refunds(charge),
        refund_amount: minor_units(charge.amount_refunded),
    })
}

fn intent_to_transaction(
    intent: &PaymentIntent,
    latest_charge: Option<&Charge>,
) -> Result<Transaction, ClientError> {
    Ok(Transaction {
        id: intent.id.clone(),
        amount: minor_units(intent.amount),
        status: TransactionStatus::from(intent.status.as_str()),
        timestamp: timestamp(&intent.id, intent.created)?,
        description: intent.description.clone(),
        product_name: intent.description.clone(),
        sku: None,
        quantity: 1,
        has_refunds: latest_charge.is_some_and(|c| c.refunded),
        refund_amount: latest_charge.map_or(Decimal::ZERO, |c| minor_units(c.amount_refunded)),
    })
}
