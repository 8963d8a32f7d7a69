//! Refund request routes.
//!
//! POST /api/refund/submit - Record a refund request and notify support

use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Extension, Json, Router};
use tracing::debug;

use super::AppState;
use crate::error::{AppError, Result};
use crate::models::{RefundReceipt, RefundSubmission};

pub fn router() -> Router {
    Router::new().route("/api/refund/submit", post(submit_refund))
}

async fn submit_refund(
    Extension(state): Extension<AppState>,
    payload: std::result::Result<Json<RefundSubmission>, JsonRejection>,
) -> Result<Json<RefundReceipt>> {
    let Json(req) = payload.map_err(|rejection| {
        debug!("Unreadable refund body: {}", rejection.body_text());
        AppError::Validation("Required fields are missing".into())
    })?;
    let receipt = state.refunds.submit(req).await?;
    Ok(Json(receipt))
}
