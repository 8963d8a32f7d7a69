//! # Refund Portal
//!
//! Customers look up their purchases by email, see which products are still
//! refundable, and submit refund requests to the support inbox.
//!
//! ## Architecture
//!
//! - Axum handles HTTP routing and the request/response lifecycle
//! - The card ledger (Stripe) is the source of truth for purchases
//! - The storefront (WooCommerce) enriches purchases with order details
//! - Postmark delivers refund requests to the support inbox
//! - SQLx optionally records refund requests in PostgreSQL

use std::sync::Arc;

use tracing::{info, warn};

use refund_portal::clients::postmark::PostmarkNotifier;
use refund_portal::clients::stripe::StripeLedgerClient;
use refund_portal::clients::woocommerce::WooCommerceClient;
use refund_portal::clients::{Collaborator, LedgerClient, Notifier, StorefrontClient, Unconfigured};
use refund_portal::config::Config;
use refund_portal::db::{self, PgRefundStore, RefundStore};
use refund_portal::reconcile::ReconciliationEngine;
use refund_portal::refunds::RefundSubmissionHandler;
use refund_portal::{create_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "refund_portal=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting refund portal");

    let config = Config::from_env();

    // One client for every collaborator; the timeout bounds each external call
    let http = reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .build()?;

    let ledger: Arc<dyn LedgerClient> = match &config.stripe {
        Some(settings) => Arc::new(StripeLedgerClient::new(http.clone(), settings)),
        None => {
            warn!("STRIPE_SECRET_KEY not set, order lookups will report a configuration error");
            Arc::new(Unconfigured(Collaborator::Ledger))
        }
    };

    let storefront: Arc<dyn StorefrontClient> = match &config.storefront {
        Some(settings) => Arc::new(WooCommerceClient::new(http.clone(), settings)),
        None => {
            warn!("Storefront credentials not set, order lookups will report a configuration error");
            Arc::new(Unconfigured(Collaborator::Storefront))
        }
    };

    let notifier: Option<Arc<dyn Notifier>> = match &config.email {
        Some(settings) => Some(Arc::new(PostmarkNotifier::new(http.clone(), settings))),
        None => {
            warn!("POSTMARK_API_KEY not set, refund notifications will be skipped");
            None
        }
    };

    let store: Option<Arc<dyn RefundStore>> = match &config.database_url {
        Some(url) => {
            let pool = db::connect(url).await?;
            info!("Connected to refund database, migrations complete");
            Some(Arc::new(PgRefundStore::new(pool)))
        }
        None => {
            info!("APP_DATABASE_URL not set, refund requests will not be recorded");
            None
        }
    };

    let state = AppState {
        engine: ReconciliationEngine::new(ledger, storefront.clone(), config.crm_cutover),
        refunds: RefundSubmissionHandler::new(notifier, store),
        storefront,
    };

    let app = create_app(state);

    let bind_addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
