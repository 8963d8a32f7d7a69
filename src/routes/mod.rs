//! HTTP route modules for the refund portal.
//!
//! - `orders`: purchase lookup and reconciliation
//! - `refunds`: refund request submission
//! - `health`: liveness and storefront connectivity

pub mod health;
pub mod orders;
pub mod refunds;

use std::sync::Arc;

use crate::clients::StorefrontClient;
use crate::reconcile::ReconciliationEngine;
use crate::refunds::RefundSubmissionHandler;

/// Shared handles injected into every route through an `Extension` layer.
#[derive(Clone)]
pub struct AppState {
    pub engine: ReconciliationEngine,
    pub refunds: RefundSubmissionHandler,
    pub storefront: Arc<dyn StorefrontClient>,
}
