//! Refund submission handling.
//!
//! A submission is validated, optionally recorded, and forwarded to the
//! support inbox. It never touches reconciliation state. Notification is
//! fire-and-forget: delivery failures are logged, not returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::clients::{Notifier, SupportMessage};
use crate::db::{RefundRequestRecord, RefundStore};
use crate::error::{AppError, Result};
use crate::models::{RefundReceipt, RefundSubmission};

const NOT_AVAILABLE: &str = "N/A";

#[derive(Clone, Default)]
pub struct RefundSubmissionHandler {
    notifier: Option<Arc<dyn Notifier>>,
    store: Option<Arc<dyn RefundStore>>,
}

impl RefundSubmissionHandler {
    pub fn new(notifier: Option<Arc<dyn Notifier>>, store: Option<Arc<dyn RefundStore>>) -> Self {
        Self { notifier, store }
    }

    pub async fn submit(&self, submission: RefundSubmission) -> Result<RefundReceipt> {
        self.submit_at(submission, Utc::now()).await
    }

    pub async fn submit_at(&self, submission: RefundSubmission, now: DateTime<Utc>) -> Result<RefundReceipt> {
        let record = validate(submission, now)?;

        if let Some(store) = &self.store {
            store.record(&record).await?;
        }

        match &self.notifier {
            Some(notifier) => {
                if let Err(e) = notifier.send(&support_message(&record)).await {
                    error!("Failed to send refund notification for {}: {}", record.id, e);
                } else {
                    info!("Refund notification sent for {}", record.id);
                }
            }
            None => warn!("Email delivery not configured, skipping refund notification"),
        }

        info!(
            "Refund request {} submitted: product={} type={}",
            record.id,
            record.product_name,
            refund_type(record.is_full_refund)
        );

        Ok(RefundReceipt {
            success: true,
            message: "Refund request submitted successfully".to_string(),
            request_id: record.id,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn validate(submission: RefundSubmission, now: DateTime<Utc>) -> Result<RefundRequestRecord> {
    let missing = || AppError::Validation("Required fields are missing".into());

    let first_name = non_empty(submission.first_name).ok_or_else(missing)?;
    let product_name = non_empty(submission.canonical_product_name).ok_or_else(missing)?;
    let is_full_refund = submission.is_full_refund.ok_or_else(missing)?;

    let total = submission.product_total.unwrap_or(Decimal::ZERO);

    Ok(RefundRequestRecord {
        id: Uuid::new_v4(),
        first_name,
        product_name,
        feedback: non_empty(submission.feedback),
        is_full_refund,
        order_reference: non_empty(submission.order_reference),
        customer_email: non_empty(submission.customer_email),
        refund_amount: refund_amount(total, is_full_refund),
        submitted_at: now,
    })
}

/// Full refunds return the whole total; partial refunds return half and keep access.
pub fn refund_amount(total: Decimal, is_full_refund: bool) -> Decimal {
    let amount = if is_full_refund { total } else { total / Decimal::TWO };
    amount.round_dp(2)
}

fn refund_type(is_full_refund: bool) -> &'static str {
    if is_full_refund {
        "Full Refund"
    } else {
        "50% Refund (Lifetime Access Retained)"
    }
}

// ============================================================================
// Support Message
// ============================================================================

fn support_message(record: &RefundRequestRecord) -> SupportMessage {
    let email = record.customer_email.as_deref().unwrap_or(NOT_AVAILABLE);
    let order = record.order_reference.as_deref().unwrap_or(NOT_AVAILABLE);
    let feedback = record.feedback.as_deref().unwrap_or("");
    let date = record.submitted_at.format("%Y-%m-%d").to_string();
    let amount = format!("${:.2}", record.refund_amount);
    let kind = refund_type(record.is_full_refund);

    let subject = format!(
        "Refund Request for {} - Order #{} - {} - {}",
        email, order, record.product_name, date
    );

    let fields = [
        ("Order ID", order),
        ("Product Name", record.product_name.as_str()),
        ("Refund Amount", amount.as_str()),
        ("Refund Type", kind),
        ("Customer Name", record.first_name.as_str()),
        ("Customer Email", email),
        ("Submission Date", date.as_str()),
        ("Customer Feedback", feedback),
    ];

    let mut text_body = String::from("New Refund Request\n\n");
    let mut rows = String::new();
    for (label, value) in fields {
        text_body.push_str(&format!("{}: {}\n", label, value));
        rows.push_str(&format!(
            "<tr><td style=\"padding: 12px; border: 1px solid #dee2e6; font-weight: bold; width: 200px;\">{}:</td>\
             <td style=\"padding: 12px; border: 1px solid #dee2e6;\">{}</td></tr>\n",
            label,
            escape_html(value)
        ));
    }

    let html_body = format!(
        r#"<h2>New Refund Request</h2>
<table style="border-collapse: collapse; width: 100%; font-family: Arial, sans-serif;">
{}</table>"#,
        rows
    );

    SupportMessage {
        reply_to: record.customer_email.clone(),
        subject,
        text_body,
        html_body,
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
