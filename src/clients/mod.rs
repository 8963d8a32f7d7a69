//! Collaborator boundary.
//!
//! The reconciliation core only sees the traits defined here. Each concrete
//! client validates upstream payloads into typed records before handing them
//! over; untyped JSON never crosses this boundary.
//!
//! - `stripe`: card ledger (authoritative transactions)
//! - `woocommerce`: storefront orders (enrichment only)
//! - `postmark`: support-inbox notifications

pub mod postmark;
pub mod stripe;
pub mod woocommerce;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{StorefrontOrder, Transaction};

/// External systems the portal depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    Ledger,
    Storefront,
}

impl Collaborator {
    pub fn display_name(self) -> &'static str {
        match self {
            Collaborator::Ledger => "Card ledger API",
            Collaborator::Storefront => "Storefront API",
        }
    }
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{0} credentials not configured")]
    NotConfigured(Collaborator),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid upstream payload: {0}")]
    Decode(String),
}

/// Card ledger: every payment made by a customer.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn list_transactions(&self, email: &str) -> Result<Vec<Transaction>, ClientError>;
}

/// Storefront order system.
#[async_trait]
pub trait StorefrontClient: Send + Sync {
    async fn list_orders(&self, email: &str) -> Result<Vec<StorefrontOrder>, ClientError>;

    /// Cheap connectivity probe used by the health routes.
    async fn check_connection(&self) -> Result<(), ClientError> {
        self.list_orders("").await.map(|_| ())
    }
}

/// Message delivered to the support inbox.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportMessage {
    pub reply_to: Option<String>,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &SupportMessage) -> Result<(), ClientError>;
}

/// Stand-in for a collaborator whose credentials are missing.
///
/// Startup never fails on missing credentials; each call reports the
/// configuration error instead so only the affected request fails.
#[derive(Debug, Clone, Copy)]
pub struct Unconfigured(pub Collaborator);

#[async_trait]
impl LedgerClient for Unconfigured {
    async fn list_transactions(&self, _email: &str) -> Result<Vec<Transaction>, ClientError> {
        Err(ClientError::NotConfigured(self.0))
    }
}

#[async_trait]
impl StorefrontClient for Unconfigured {
    async fn list_orders(&self, _email: &str) -> Result<Vec<StorefrontOrder>, ClientError> {
        Err(ClientError::NotConfigured(self.0))
    }

    async fn check_connection(&self) -> Result<(), ClientError> {
        Err(ClientError::NotConfigured(self.0))
    }
}

/// Read a non-success response into a `ClientError::Status`.
pub(crate) async fn status_error(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ClientError::Status { status, body }
}
