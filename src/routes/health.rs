//! Health and connectivity routes.
//!
//! GET /api/health          - Liveness
//! GET /api/storefront/test - Single storefront fetch to verify credentials

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::AppState;
use crate::clients::ClientError;
use crate::error::AppError;

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/storefront/test", get(storefront_test))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn storefront_test(
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.storefront.check_connection().await {
        Ok(()) => {
            info!("Storefront connectivity check passed");
            Ok(Json(json!({
                "success": true,
                "message": "Storefront API connection successful",
            })))
        }
        Err(ClientError::NotConfigured(collaborator)) => {
            let err = AppError::Configuration(collaborator);
            Err((
                err.status(),
                Json(json!({ "success": false, "message": err.public_message() })),
            ))
        }
        Err(e) => {
            warn!("Storefront connectivity check failed: {}", e);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "success": false,
                    "message": "Storefront API connection failed",
                })),
            ))
        }
    }
}
