//! Matching, bulk reconciliation, and link/unlink operations.

use crate::db::CrmDb;
use crate::enrich;
use crate::error::CrmError;
use crate::invoicing::InvoicingProvider;
use crate::matching::MatchThresholds;
use crate::reconcile;
use crate::types::{LinkSummary, MatchResult};

fn require_id(value: &str, what: &str) -> Result<(), CrmError> {
    if value.trim().is_empty() {
        return Err(CrmError::Validation(format!("{} is required", what)));
    }
    Ok(())
}

/// Best invoicing-customer match for one company, or None — a legitimate
/// "no match found", distinct from any configuration error the provider
/// raises.
pub async fn match_company(
    db: &CrmDb,
    invoicing: &dyn InvoicingProvider,
    thresholds: &MatchThresholds,
    company_id: &str,
) -> Result<Option<MatchResult>, CrmError> {
    require_id(company_id, "companyId")?;
    let company = db
        .get_company(company_id)?
        .ok_or_else(|| CrmError::not_found("Company", company_id))?;

    let customers = invoicing.list_customers(None).await?;
    Ok(reconcile::best_customer_match(&company, &customers, thresholds))
}

/// Full triage queue over every company and every invoicing customer.
pub async fn bulk_reconcile(
    db: &CrmDb,
    invoicing: &dyn InvoicingProvider,
    thresholds: &MatchThresholds,
) -> Result<Vec<MatchResult>, CrmError> {
    let companies = db.get_all_companies()?;
    let customers = invoicing.list_customers(None).await?;
    log::info!(
        "Reconciling {} companies against {} invoicing customers",
        companies.len(),
        customers.len()
    );
    Ok(reconcile::reconcile(&companies, &customers, thresholds))
}

/// Link a company to an invoicing customer and copy missing contact fields.
///
/// Writing the link id is the primary effect; enrichment is best-effort. A
/// failed estimate/invoice fetch degrades to "link succeeds, enrichment
/// skipped" — only a missing customer fails the operation.
pub async fn link_company(
    db: &CrmDb,
    invoicing: &dyn InvoicingProvider,
    company_id: &str,
    external_customer_id: &str,
) -> Result<LinkSummary, CrmError> {
    require_id(company_id, "companyId")?;
    require_id(external_customer_id, "externalCustomerId")?;

    let mut company = db
        .get_company(company_id)?
        .ok_or_else(|| CrmError::not_found("Company", company_id))?;
    let customer = invoicing
        .get_customer(external_customer_id)
        .await?
        .ok_or_else(|| CrmError::not_found("ExternalCustomer", external_customer_id))?;

    let estimates = match invoicing.list_estimates(external_customer_id).await {
        Ok(estimates) => estimates,
        Err(e) => {
            log::warn!("Estimate fetch failed for {}: {}. Enrichment skipped.", external_customer_id, e);
            Vec::new()
        }
    };
    let invoices = match invoicing.list_invoices(external_customer_id).await {
        Ok(invoices) => invoices,
        Err(e) => {
            log::warn!("Invoice fetch failed for {}: {}. Enrichment skipped.", external_customer_id, e);
            Vec::new()
        }
    };

    let summary = enrich::apply_link(&mut company, &customer, &estimates, &invoices);
    if !summary.updated_fields.is_empty() {
        db.update_company(&company)?;
        log::info!(
            "Linked {} to customer {}: {}",
            company_id,
            external_customer_id,
            summary.change_summary.join(", ")
        );
    }
    db.insert_enrichment_log(
        company_id,
        "link",
        Some(external_customer_id),
        &summary.updated_fields,
    )?;

    Ok(summary)
}

/// Clear the invoicing link. Copied fields and the type transition stay.
pub fn unlink_company(db: &CrmDb, company_id: &str) -> Result<(), CrmError> {
    require_id(company_id, "companyId")?;
    let company = db
        .get_company(company_id)?
        .ok_or_else(|| CrmError::not_found("Company", company_id))?;
    if company.external_customer_id.is_none() {
        return Ok(()); // already unlinked
    }

    db.clear_external_link(company_id)?;
    db.insert_enrichment_log(company_id, "unlink", company.external_customer_id.as_deref(), &[])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::companies::test_fixtures::company;
    use crate::invoicing::provider::fixtures::FixtureProvider;
    use crate::invoicing::{Invoice, InvoiceCustomer};
    use crate::types::MatchStatus;

    fn acme_customer() -> InvoiceCustomer {
        serde_json::from_str(
            r#"{
                "id": "cust-1",
                "companyName": "Acme Fence Co",
                "phone": "(302) 555-1212",
                "emailContacts": [{"email": "office@acme.com"}]
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_match_company_finds_exact_name() {
        let db = CrmDb::open_in_memory();
        db.insert_company(&company("co-1", "ACME FENCE CO")).unwrap();
        let provider = FixtureProvider {
            customers: vec![acme_customer()],
            ..Default::default()
        };

        let result = match_company(&db, &provider, &MatchThresholds::default(), "co-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.score, 100);
        assert_eq!(result.external_customer_id, "cust-1");
    }

    #[tokio::test]
    async fn test_match_company_none_is_not_an_error() {
        let db = CrmDb::open_in_memory();
        db.insert_company(&company("co-1", "Riverside Decks")).unwrap();
        let provider = FixtureProvider {
            customers: vec![acme_customer()],
            ..Default::default()
        };

        let result = match_company(&db, &provider, &MatchThresholds::default(), "co-1")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_match_company_validates_input() {
        let db = CrmDb::open_in_memory();
        let provider = FixtureProvider::default();
        let err = match_company(&db, &provider, &MatchThresholds::default(), "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));

        let err = match_company(&db, &provider, &MatchThresholds::default(), "co-ghost")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_link_company_writes_back_and_logs() {
        let db = CrmDb::open_in_memory();
        db.insert_company(&company("co-1", "Acme Fence Co")).unwrap();
        let mut provider = FixtureProvider {
            customers: vec![acme_customer()],
            ..Default::default()
        };
        provider.invoices.insert(
            "cust-1".to_string(),
            vec![Invoice {
                id: "inv-1".to_string(),
                customer_id: "cust-1".to_string(),
                date: "2024-02-01".to_string(),
                ..Default::default()
            }],
        );

        let summary = link_company(&db, &provider, "co-1", "cust-1").await.unwrap();
        assert!(summary.change_summary.contains(&"phone added".to_string()));

        let loaded = db.get_company("co-1").unwrap().unwrap();
        assert_eq!(loaded.external_customer_id.as_deref(), Some("cust-1"));
        assert_eq!(loaded.company_type, "Customer");
        assert_eq!(loaded.last_order_date.as_deref(), Some("2024-02-01"));

        let log_count: i64 = db
            .conn_ref()
            .query_row(
                "SELECT COUNT(*) FROM enrichment_log WHERE company_id = 'co-1' AND event_type = 'link'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(log_count, 1);
    }

    #[tokio::test]
    async fn test_link_degrades_when_documents_unavailable() {
        let db = CrmDb::open_in_memory();
        db.insert_company(&company("co-1", "Acme Fence Co")).unwrap();
        let provider = FixtureProvider {
            customers: vec![acme_customer()],
            fail_documents: true,
            ..Default::default()
        };

        // Link still succeeds; the type transition and date sync are skipped.
        let summary = link_company(&db, &provider, "co-1", "cust-1").await.unwrap();
        assert!(summary
            .updated_fields
            .contains(&"external_customer_id".to_string()));

        let loaded = db.get_company("co-1").unwrap().unwrap();
        assert_eq!(loaded.external_customer_id.as_deref(), Some("cust-1"));
        assert_eq!(loaded.company_type, "Prospect");
        assert!(loaded.last_order_date.is_none());
    }

    #[tokio::test]
    async fn test_link_missing_customer_is_not_found() {
        let db = CrmDb::open_in_memory();
        db.insert_company(&company("co-1", "Acme Fence Co")).unwrap();
        let provider = FixtureProvider::default();

        let err = link_company(&db, &provider, "co-1", "cust-ghost").await.unwrap_err();
        assert!(err.is_not_found());
        // No partial effect
        assert!(db.get_company("co-1").unwrap().unwrap().external_customer_id.is_none());
    }

    #[tokio::test]
    async fn test_relink_is_idempotent() {
        let db = CrmDb::open_in_memory();
        db.insert_company(&company("co-1", "Acme Fence Co")).unwrap();
        let provider = FixtureProvider {
            customers: vec![acme_customer()],
            ..Default::default()
        };

        let first = link_company(&db, &provider, "co-1", "cust-1").await.unwrap();
        assert!(!first.change_summary.is_empty());
        let second = link_company(&db, &provider, "co-1", "cust-1").await.unwrap();
        assert!(second.change_summary.is_empty());
    }

    #[tokio::test]
    async fn test_unlink_keeps_enriched_fields() {
        let db = CrmDb::open_in_memory();
        db.insert_company(&company("co-1", "Acme Fence Co")).unwrap();
        let provider = FixtureProvider {
            customers: vec![acme_customer()],
            ..Default::default()
        };
        link_company(&db, &provider, "co-1", "cust-1").await.unwrap();

        unlink_company(&db, "co-1").unwrap();
        let loaded = db.get_company("co-1").unwrap().unwrap();
        assert!(loaded.external_customer_id.is_none());
        assert_eq!(loaded.phone.as_deref(), Some("(302) 555-1212"));

        // Unlinking an unlinked company is a no-op
        unlink_company(&db, "co-1").unwrap();
    }

    #[tokio::test]
    async fn test_bulk_reconcile_end_to_end() {
        let db = CrmDb::open_in_memory();
        db.insert_company(&company("co-acme", "Acme Fence Co")).unwrap();
        for i in 0..9 {
            db.insert_company(&company(&format!("co-{}", i), &format!("Unrelated {}", i)))
                .unwrap();
        }
        let other = InvoiceCustomer {
            id: "cust-2".to_string(),
            company_name: "Nothing Alike Roofing".to_string(),
            ..Default::default()
        };
        let provider = FixtureProvider {
            customers: vec![acme_customer(), other],
            ..Default::default()
        };

        let results = bulk_reconcile(&db, &provider, &MatchThresholds::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, MatchStatus::Suggested);
        assert_eq!(results[0].company_id.as_deref(), Some("co-acme"));
        assert_eq!(results[1].status, MatchStatus::Unmatched);
    }
}
