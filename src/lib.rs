//! # Refund Portal Library
//!
//! Exposes the Axum router and the reconciliation core so integration tests
//! can drive the application in-process with fake collaborators.

pub mod catalog;
pub mod clients;
pub mod config;
pub mod db;
pub mod eligibility;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod refunds;
pub mod routes;

use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use routes::AppState;

/// Build the Axum router with all route modules and middleware.
///
/// The caller wires the collaborators into `state`. This function does NOT
/// start a server.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::orders::router())
        .merge(routes::refunds::router())
        .merge(routes::health::router())
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
