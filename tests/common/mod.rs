//! Shared fakes and helpers for router-level tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use refund_portal::clients::{ClientError, LedgerClient, Notifier, StorefrontClient, SupportMessage};
use refund_portal::config::default_crm_cutover;
use refund_portal::models::{Billing, LineItem, StorefrontOrder, Transaction, TransactionStatus};
use refund_portal::reconcile::ReconciliationEngine;
use refund_portal::refunds::RefundSubmissionHandler;
use refund_portal::{create_app, AppState};

// ------------------------------------------------------------------------
// Fake Collaborators
// ------------------------------------------------------------------------

pub enum Behavior<T> {
    Return(T),
    Fail,
}

pub struct FakeLedger {
    behavior: Behavior<Vec<Transaction>>,
    pub calls: AtomicUsize,
}

impl FakeLedger {
    pub fn returning(transactions: Vec<Transaction>) -> Arc<Self> {
        Arc::new(Self {
            behavior: Behavior::Return(transactions),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            behavior: Behavior::Fail,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn list_transactions(&self, _email: &str) -> Result<Vec<Transaction>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Return(transactions) => Ok(transactions.clone()),
            Behavior::Fail => Err(ClientError::Status {
                status: 401,
                body: "Invalid API Key provided: sk_test_****".into(),
            }),
        }
    }
}

pub struct FakeStorefront {
    behavior: Behavior<Vec<StorefrontOrder>>,
    pub calls: AtomicUsize,
}

impl FakeStorefront {
    pub fn returning(orders: Vec<StorefrontOrder>) -> Arc<Self> {
        Arc::new(Self {
            behavior: Behavior::Return(orders),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            behavior: Behavior::Fail,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorefrontClient for FakeStorefront {
    async fn list_orders(&self, _email: &str) -> Result<Vec<StorefrontOrder>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Return(orders) => Ok(orders.clone()),
            Behavior::Fail => Err(ClientError::Status {
                status: 500,
                body: "internal error".into(),
            }),
        }
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    pub sent: Mutex<Vec<SupportMessage>>,
    pub fail: bool,
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send(&self, message: &SupportMessage) -> Result<(), ClientError> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail {
            return Err(ClientError::Status {
                status: 500,
                body: "mail server down".into(),
            });
        }
        Ok(())
    }
}

// ------------------------------------------------------------------------
// App Builders
// ------------------------------------------------------------------------

pub fn app_with(
    ledger: Arc<dyn LedgerClient>,
    storefront: Arc<dyn StorefrontClient>,
    notifier: Option<Arc<dyn Notifier>>,
) -> Router {
    create_app(AppState {
        engine: ReconciliationEngine::new(ledger, storefront.clone(), default_crm_cutover()),
        refunds: RefundSubmissionHandler::new(notifier, None),
        storefront,
    })
}

// ------------------------------------------------------------------------
// Fixtures
// ------------------------------------------------------------------------

pub fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

pub fn transaction(id: &str, amount: i64, at: DateTime<Utc>, description: &str) -> Transaction {
    Transaction {
        id: id.into(),
        amount: Decimal::from(amount),
        status: TransactionStatus::Succeeded,
        timestamp: at,
        description: Some(description.into()),
        product_name: None,
        sku: None,
        quantity: 1,
        has_refunds: false,
        refund_amount: Decimal::ZERO,
    }
}

pub fn storefront_order(id: u64, at: DateTime<Utc>, item: &str, total: i64) -> StorefrontOrder {
    StorefrontOrder {
        id,
        number: id.to_string(),
        status: "completed".into(),
        date_created: at,
        transaction_id: None,
        line_items: vec![LineItem {
            product_id: 100 + id,
            name: item.into(),
            quantity: 1,
            total: Decimal::from(total),
            sku: None,
        }],
        billing: Billing {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: Some("jane@example.com".into()),
        },
        refunds: Vec::new(),
    }
}

// ------------------------------------------------------------------------
// Request Helpers
// ------------------------------------------------------------------------

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read_json(response).await
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read_json(response).await
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
