//! Refund request persistence.
//!
//! Recording is optional: without `APP_DATABASE_URL` the portal still accepts
//! refund requests and only notifies the support inbox.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

/// A refund request as stored in `refund_requests`.
#[derive(Debug, Clone, PartialEq)]
pub struct RefundRequestRecord {
    pub id: Uuid,
    pub first_name: String,
    pub product_name: String,
    pub feedback: Option<String>,
    pub is_full_refund: bool,
    pub order_reference: Option<String>,
    pub customer_email: Option<String>,
    pub refund_amount: Decimal,
    pub submitted_at: DateTime<Utc>,
}

#[async_trait]
pub trait RefundStore: Send + Sync {
    async fn record(&self, request: &RefundRequestRecord) -> Result<(), sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgRefundStore {
    pool: PgPool,
}

impl PgRefundStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefundStore for PgRefundStore {
    async fn record(&self, request: &RefundRequestRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO refund_requests
                (id, first_name, product_name, feedback, is_full_refund,
                 order_reference, customer_email, refund_amount, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(request.id)
        .bind(&request.first_name)
        .bind(&request.product_name)
        .bind(&request.feedback)
        .bind(request.is_full_refund)
        .bind(&request.order_reference)
        .bind(&request.customer_email)
        .bind(request.refund_amount)
        .bind(request.submitted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Connect to the refund database and apply pending migrations.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
