//! External invoicing store integration (read-only).
//!
//! The invoicing system owns its customer/estimate/invoice records; this
//! module only reads them. Payloads are camelCase JSON with `#[serde(default)]`
//! tolerance so partially-filled records deserialize instead of failing a
//! whole page.
//!
//! Modules:
//! - client: direct HTTP via reqwest
//! - provider: the `InvoicingProvider` seam the services call through

pub mod client;
pub mod provider;

pub use client::InvoicingClient;
pub use provider::InvoicingProvider;

use serde::{Deserialize, Serialize};

// ============================================================================
// Record types (deserialized from invoicing-store JSON)
// ============================================================================

/// A customer record in the invoicing store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceCustomer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<CustomerAddress>,
    #[serde(default)]
    pub customer_type: Option<String>,
    #[serde(default)]
    pub email_contacts: Vec<EmailContact>,
}

impl InvoiceCustomer {
    /// First and last name joined by a single space; empty parts dropped.
    pub fn full_name(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        for part in [self.first_name.trim(), self.last_name.trim()] {
            if !part.is_empty() {
                parts.push(part);
            }
        }
        parts.join(" ")
    }

    /// First usable email address from the contact list.
    pub fn primary_email(&self) -> Option<&str> {
        self.email_contacts
            .iter()
            .map(|c| c.email())
            .find(|e| !e.trim().is_empty())
    }
}

/// Postal address on an invoicing customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAddress {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
}

/// The store serializes email contacts either as `{"email": "..."}` objects
/// or as plain strings, depending on record age.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmailContact {
    Entry {
        #[serde(default)]
        email: String,
    },
    Plain(String),
}

impl EmailContact {
    pub fn email(&self) -> &str {
        match self {
            EmailContact::Entry { email } => email,
            EmailContact::Plain(email) => email,
        }
    }
}

/// An estimate (quote) in the invoicing store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub customer_id: String,
    /// Business date, ISO-8601.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total: f64,
}

/// An invoice in the invoicing store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub customer_id: String,
    /// Business date, ISO-8601.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub amount_paid: f64,
    #[serde(default)]
    pub balance_due: f64,
}

// ============================================================================
// Error type
// ============================================================================

/// Errors from invoicing-store operations.
#[derive(Debug, thiserror::Error)]
pub enum InvoicingError {
    /// Base URL or API key missing. Surfaced fast so "integration
    /// unavailable" never masquerades as "no results".
    #[error("Invoicing integration not configured")]
    NotConfigured,

    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}
