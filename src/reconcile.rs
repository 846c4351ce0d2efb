//! Bulk reconciliation of CRM companies against invoicing customers.
//!
//! Pure read + compute: the caller fetches both collections, this module
//! produces the triage queue. Persistence happens only through link
//! enrichment.

use crate::db::DbCompany;
use crate::invoicing::InvoiceCustomer;
use crate::matching::{self, MatchThresholds};
use crate::types::{MatchResult, MatchStatus};

/// Score every unlinked customer against every company not already claimed
/// by a different customer, and emit one row per customer.
///
/// Already-linked pairs bypass scoring: they come out directly as
/// score 100 / linked. Ordering is the triage queue contract — suggested,
/// then unmatched, then linked, score descending within each group.
///
/// O(companies × customers); both sets are small and `matching::score` is
/// allocation-light, so the nested loop is fine.
pub fn reconcile(
    companies: &[DbCompany],
    customers: &[InvoiceCustomer],
    thresholds: &MatchThresholds,
) -> Vec<MatchResult> {
    let mut results: Vec<MatchResult> = Vec::with_capacity(customers.len());

    for customer in customers {
        if customer.id.is_empty() {
            log::warn!("Skipping invoicing customer with empty id");
            continue;
        }

        // Existing link wins outright.
        if let Some(linked) = companies
            .iter()
            .find(|c| c.external_customer_id.as_deref() == Some(customer.id.as_str()))
        {
            results.push(MatchResult {
                company_id: Some(linked.id.clone()),
                external_customer_id: customer.id.clone(),
                score: 100,
                status: MatchStatus::Linked,
            });
            continue;
        }

        // Candidates: companies not linked to a *different* customer.
        let mut best: Option<(&DbCompany, u8)> = None;
        for company in companies {
            if company.external_customer_id.is_some() {
                continue;
            }
            let score = matching::score(company, customer);
            if score == 0 {
                continue;
            }
            match best {
                Some((_, top)) if top >= score => {}
                _ => best = Some((company, score)),
            }
        }

        let (company_id, score) = match best {
            Some((company, score)) => (Some(company.id.clone()), score),
            None => (None, 0),
        };
        let status = if score >= thresholds.suggest {
            MatchStatus::Suggested
        } else {
            MatchStatus::Unmatched
        };
        results.push(MatchResult {
            company_id,
            external_customer_id: customer.id.clone(),
            score,
            status,
        });
    }

    results.sort_by(|a, b| {
        a.status
            .triage_rank()
            .cmp(&b.status.triage_rank())
            .then(b.score.cmp(&a.score))
    });
    results
}

/// Best customer for a single company: the reverse direction of
/// `reconcile`, used by the per-company match lookup.
///
/// Returns the highest-scoring customer at or above `thresholds.found`,
/// or None — a legitimate "no match", distinct from any error.
pub fn best_customer_match(
    company: &DbCompany,
    customers: &[InvoiceCustomer],
    thresholds: &MatchThresholds,
) -> Option<MatchResult> {
    let mut best: Option<(&InvoiceCustomer, u8)> = None;
    for customer in customers {
        if customer.id.is_empty() {
            continue;
        }
        let score = matching::score(company, customer);
        match best {
            Some((_, top)) if top >= score => {}
            _ => best = Some((customer, score)),
        }
    }

    let (customer, score) = best?;
    if score < thresholds.found {
        return None;
    }

    let status = if company.external_customer_id.as_deref() == Some(customer.id.as_str()) {
        MatchStatus::Linked
    } else {
        MatchStatus::Suggested
    };
    Some(MatchResult {
        company_id: Some(company.id.clone()),
        external_customer_id: customer.id.clone(),
        score,
        status,
    })
}
