//! Error types for the CRM core.
//!
//! Errors are classified by what the caller should do with them:
//! - Configuration: the invoicing integration is not set up — surface
//!   immediately, never retry, never degrade to an empty result.
//! - NotFound: a referenced record does not exist — no partial effect.
//! - Validation: malformed input rejected before any computation or write.
//!
//! Malformed semi-structured data (tags, notes) is NOT an error: the store
//! degrades it to empty and keeps going, so reports stay available.

use thiserror::Error;

use crate::db::DbError;
use crate::invoicing::InvoicingError;

/// Error type for the operations exposed to the REST layer.
#[derive(Debug, Error)]
pub enum CrmError {
    /// The invoicing integration is absent or incomplete.
    #[error("Invoicing integration not configured: {0}")]
    NotConfigured(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Invoicing request failed: {0}")]
    Invoicing(InvoicingError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CrmError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CrmError::NotFound { kind, id: id.into() }
    }

    /// True when the error is an operational configuration problem rather
    /// than a data problem. Callers use this to distinguish "integration
    /// unavailable" from a legitimate "no match found".
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CrmError::NotConfigured(_)
                | CrmError::Invoicing(InvoicingError::NotConfigured)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CrmError::NotFound { .. } | CrmError::Db(DbError::RowNotFound { .. })
        )
    }
}

impl From<InvoicingError> for CrmError {
    fn from(err: InvoicingError) -> Self {
        match err {
            InvoicingError::NotConfigured => {
                CrmError::NotConfigured("invoicing base URL or API key missing".to_string())
            }
            other => CrmError::Invoicing(other),
        }
    }
}
