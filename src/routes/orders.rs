//! Order lookup routes.
//!
//! POST /api/orders/lookup - Reconcile a customer's purchases by email

use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Extension, Json, Router};
use tracing::{debug, info};

use super::AppState;
use crate::error::{AppError, Result};
use crate::models::{LookupRequest, LookupResponse};

/// Build the orders router.
pub fn router() -> Router {
    Router::new().route("/api/orders/lookup", post(lookup_orders))
}

/// Look up every purchase made with an email address.
///
/// Purchases come from the card ledger; storefront orders only enrich them.
/// Validation, configuration and ledger failures map to their own status
/// codes through `AppError`. A body that does not deserialize is treated as
/// an invalid email.
async fn lookup_orders(
    Extension(state): Extension<AppState>,
    payload: std::result::Result<Json<LookupRequest>, JsonRejection>,
) -> Result<Json<LookupResponse>> {
    let Json(req) = payload.map_err(|rejection| {
        debug!("Unreadable lookup body: {}", rejection.body_text());
        AppError::Validation("Please enter a valid email address".into())
    })?;
    let reconciliation = state.engine.reconcile(&req.email).await?;

    info!(
        "Lookup for {}: {} purchases, {} display products",
        reconciliation.customer_email,
        reconciliation.total_orders(),
        reconciliation.products.len()
    );

    Ok(Json(reconciliation.into()))
}
