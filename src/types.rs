//! Types produced for the REST layer.
//!
//! Everything here is read-side output: match results, link summaries, and
//! the report structures. Serialization is camelCase to match the frontend.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Matching / reconciliation
// ---------------------------------------------------------------------------

/// Triage status of a company ↔ invoicing-customer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Suggested,
    Unmatched,
    Linked,
}

impl MatchStatus {
    /// Fixed display order of the triage queue: actionable suggestions first,
    /// then gaps, then already-settled links.
    pub fn triage_rank(self) -> u8 {
        match self {
            MatchStatus::Suggested => 0,
            MatchStatus::Unmatched => 1,
            MatchStatus::Linked => 2,
        }
    }
}

/// One row of the reconciliation output. `company_id` is None when no
/// company scored above zero for the customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub company_id: Option<String>,
    pub external_customer_id: String,
    /// Confidence 0–100 that the two records are the same business.
    pub score: u8,
    pub status: MatchStatus,
}

/// Outcome of linking a company to an invoicing customer.
///
/// `updated_fields` are machine field names; `change_summary` is the
/// human-readable audit list shown for confirmation. Both are empty when
/// re-linking an already-enriched company with unchanged external data.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSummary {
    pub updated_fields: Vec<String>,
    pub change_summary: Vec<String>,
}

// ---------------------------------------------------------------------------
// Date filtering
// ---------------------------------------------------------------------------

/// Inclusive business-date range for report filters. Either bound may be
/// open.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if date > end {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Per-bucket activity counters. `answered`/`interested` count flag
/// occurrences independent of activity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCounts {
    pub calls: u32,
    pub emails: u32,
    pub answered: u32,
    pub interested: u32,
}

/// Time-bucketed activity report. Keys: `by_date` = calendar day,
/// `by_week` = Sunday that starts the week, `by_month` = YYYY-MM.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReport {
    pub by_date: BTreeMap<String, ActivityCounts>,
    pub by_week: BTreeMap<String, ActivityCounts>,
    pub by_month: BTreeMap<String, ActivityCounts>,
    pub total: usize,
}

/// Conversion funnel over distinct companies. `customers` is the current
/// snapshot count, not filtered by the activity date range.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelReport {
    pub total_companies: usize,
    pub contacted: usize,
    pub answered: usize,
    pub interested: usize,
    pub customers: usize,
}

/// Per-employee performance counters and derived rates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeStats {
    pub employee_id: String,
    pub name: String,
    pub calls: u32,
    pub emails: u32,
    pub total_activities: u32,
    pub answered: u32,
    pub interested: u32,
    pub follow_ups: u32,
    /// round(answered / calls × 100); 0 when the employee logged no calls.
    /// The denominator is calls, not total activities — answered emails
    /// count in `answered` but not here.
    pub answer_rate: u32,
    /// round(interested / answered × 100); 0 when nothing was answered.
    pub interest_rate: u32,
}

/// Company counts for one `type` bucket of the pipeline report.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeBucket {
    pub total: u32,
    pub customers: u32,
    pub prospects: u32,
}

/// Derived-status counts. A company lands in exactly one bucket; the
/// precedence is customers, interested, needs_follow_up, contacted,
/// not_contacted, evaluated in that order.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBuckets {
    pub customers: u32,
    pub interested: u32,
    pub needs_follow_up: u32,
    pub contacted: u32,
    pub not_contacted: u32,
}

/// Pipeline breakdown: three independent groupings over the company set.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub by_type: BTreeMap<String, TypeBucket>,
    pub by_tag: BTreeMap<String, u32>,
    pub by_status: StatusBuckets,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triage_rank_order() {
        assert!(MatchStatus::Suggested.triage_rank() < MatchStatus::Unmatched.triage_rank());
        assert!(MatchStatus::Unmatched.triage_rank() < MatchStatus::Linked.triage_rank());
    }

    #[test]
    fn test_date_range_bounds_inclusive() {
        let range = DateRange {
            start: Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            end: Some(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()),
        };
        assert!(range.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert!(range.contains(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()));
    }

    #[test]
    fn test_open_range_contains_everything() {
        let range = DateRange::default();
        assert!(range.contains(NaiveDate::from_ymd_opt(1999, 1, 1).unwrap()));
    }

    #[test]
    fn test_match_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MatchStatus::Suggested).unwrap(),
            "\"suggested\""
        );
    }
}
