//! Shared type definitions for the database layer.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("{kind} not found: {id}")]
    RowNotFound { kind: &'static str, id: String },

    #[error("Invalid business date (expected zero-padded YYYY-MM-DD): {0}")]
    InvalidDate(String),
}

impl DbError {
    pub fn row_not_found(kind: &'static str, id: impl Into<String>) -> Self {
        DbError::RowNotFound { kind, id: id.into() }
    }
}

/// A single note on a company. The notes list is ordered newest-first and
/// stored as a JSON array in the `notes` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyNote {
    pub author: String,
    pub text: String,
    /// RFC-3339 UTC timestamp of when the note was written.
    pub timestamp: String,
}

/// A row from the `companies` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbCompany {
    pub id: String,
    pub name: String,
    /// Free-text category ("Prospect", "Customer", "Vendor", ...).
    #[serde(rename = "type")]
    pub company_type: String,
    pub contact_name: Option<String>,
    /// Street address; city/state/zip are separate columns.
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    /// Newest-first. Appends must preserve this ordering.
    pub notes: Vec<CompanyNote>,
    pub is_customer: bool,
    pub tags: BTreeSet<String>,
    pub follow_up_date: Option<String>,
    pub follow_up_note: Option<String>,
    /// Synced from the invoicing store: date of the newest invoice.
    pub last_order_date: Option<String>,
    /// Synced from the invoicing store: date of the newest estimate.
    pub last_estimate_date: Option<String>,
    /// Link into the invoicing store. None = unlinked.
    pub external_customer_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `employees` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbEmployee {
    pub id: String,
    pub name: String,
    pub role: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `users` table (login accounts).
///
/// `employee_id` is an explicit nullable reference; legacy rows that only
/// carried a display-name association are backfilled on open by
/// `CrmDb::backfill_user_employee_links`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbUser {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub employee_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Kind of a logged interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Call,
    Email,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Call => "call",
            ActivityKind::Email => "email",
        }
    }

    /// Parse a stored kind. Unknown values degrade to `Call` with a warning
    /// rather than failing the whole query.
    pub fn parse(value: &str) -> Self {
        match value {
            "call" => ActivityKind::Call,
            "email" => ActivityKind::Email,
            other => {
                log::warn!("Unknown activity kind {:?}, treating as call", other);
                ActivityKind::Call
            }
        }
    }
}

/// A row from the `activities` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbActivity {
    pub id: String,
    pub company_id: String,
    pub employee_id: String,
    pub kind: ActivityKind,
    pub answered: bool,
    pub interested: bool,
    pub follow_up: bool,
    pub notes: Option<String>,
    /// Business date (YYYY-MM-DD) of the interaction, distinct from
    /// `created_at`.
    pub date: String,
    pub created_at: String,
}

/// A row from the `enrichment_log` audit trail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbEnrichmentLog {
    pub id: String,
    pub company_id: String,
    pub event_type: String,
    pub external_customer_id: Option<String>,
    pub fields_updated: Vec<String>,
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// JSON column helpers
// ---------------------------------------------------------------------------

/// Parse the `notes` JSON column. Malformed data degrades to an empty list —
/// reports must stay available even with dirty rows.
pub(crate) fn parse_notes_column(company_id: &str, raw: Option<&str>) -> Vec<CompanyNote> {
    let raw = match raw {
        Some(r) if !r.is_empty() => r,
        _ => return Vec::new(),
    };
    match serde_json::from_str(raw) {
        Ok(notes) => notes,
        Err(e) => {
            log::warn!("Company {}: unparseable notes column ({}), treating as empty", company_id, e);
            Vec::new()
        }
    }
}

/// Parse the `tags` JSON column with the same degrade-to-empty contract.
pub(crate) fn parse_tags_column(company_id: &str, raw: Option<&str>) -> BTreeSet<String> {
    let raw = match raw {
        Some(r) if !r.is_empty() => r,
        _ => return BTreeSet::new(),
    };
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(tags) => tags.into_iter().collect(),
        Err(e) => {
            log::warn!("Company {}: unparseable tags column ({}), treating as empty", company_id, e);
            BTreeSet::new()
        }
    }
}
