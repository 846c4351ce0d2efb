//! Link enrichment: copying missing contact fields from a linked invoicing
//! customer into the CRM company.
//!
//! The merge never overwrites a non-empty company field, so re-running a
//! link with unchanged external data yields an empty change summary. The
//! type promotion to "Customer" and all copied fields survive an unlink —
//! enrichment is one-way.

use chrono::NaiveDate;

use crate::db::DbCompany;
use crate::invoicing::{Estimate, Invoice, InvoiceCustomer};
use crate::matching::normalize;
use crate::types::LinkSummary;

/// Merge `customer` (plus its estimate/invoice history) into `company`,
/// recording what actually changed. The caller persists the mutated copy.
pub fn apply_link(
    company: &mut DbCompany,
    customer: &InvoiceCustomer,
    estimates: &[Estimate],
    invoices: &[Invoice],
) -> LinkSummary {
    let mut summary = LinkSummary::default();

    // The link id itself is written unconditionally; it only counts as a
    // change when it differs from the current value.
    if company.external_customer_id.as_deref() != Some(customer.id.as_str()) {
        company.external_customer_id = Some(customer.id.clone());
        summary.updated_fields.push("external_customer_id".to_string());
        summary
            .change_summary
            .push(format!("linked to invoicing customer {}", customer.id));
    }

    let full_name = customer.full_name();
    let (street, city, state, zip) = match &customer.address {
        Some(addr) => (
            addr.street.as_deref(),
            addr.city.as_deref(),
            addr.state.as_deref(),
            addr.zip.as_deref(),
        ),
        None => (None, None, None, None),
    };

    let mut fills: Vec<(&'static str, &'static str, Option<&str>, &mut Option<String>)> = vec![
        ("phone", "phone", customer.phone.as_deref(), &mut company.phone),
        ("email", "email", customer.primary_email(), &mut company.email),
        (
            "contact_name",
            "contact name",
            if full_name.is_empty() { None } else { Some(full_name.as_str()) },
            &mut company.contact_name,
        ),
        ("address", "address", street, &mut company.address),
        ("city", "city", city, &mut company.city),
        ("state", "state", state, &mut company.state),
        ("zip", "zip", zip, &mut company.zip),
    ];
    for (field, label, value, target) in fills.iter_mut() {
        if try_fill(target, *value) {
            summary.updated_fields.push(field.to_string());
            summary.change_summary.push(format!("{} added", label));
        }
    }

    // One-way transition: an invoice history makes this a customer. No
    // invoice never downgrades it back.
    if !invoices.is_empty() && normalize(&company.company_type) != "customer" {
        company.company_type = "Customer".to_string();
        summary.updated_fields.push("type".to_string());
        summary.change_summary.push("type set to Customer".to_string());
    }

    if let Some(newest) = max_business_date(estimates.iter().map(|e| e.date.as_str())) {
        if company.last_estimate_date.as_deref() != Some(newest.as_str()) {
            company.last_estimate_date = Some(newest);
            summary.updated_fields.push("last_estimate_date".to_string());
            summary.change_summary.push("last estimate date updated".to_string());
        }
    }
    if let Some(newest) = max_business_date(invoices.iter().map(|i| i.date.as_str())) {
        if company.last_order_date.as_deref() != Some(newest.as_str()) {
            company.last_order_date = Some(newest);
            summary.updated_fields.push("last_order_date".to_string());
            summary.change_summary.push("last order date updated".to_string());
        }
    }

    summary
}

/// Fill `target` only when it is currently blank and the new value isn't.
fn try_fill(target: &mut Option<String>, value: Option<&str>) -> bool {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => return false,
    };
    if target.as_deref().is_some_and(|cur| !cur.trim().is_empty()) {
        return false;
    }
    *target = Some(value.to_string());
    true
}

/// Newest date across a document set, compared as parsed dates rather than
/// strings. Unparseable dates are skipped with a warning — dirty documents
/// must not block the link.
fn max_business_date<'a>(dates: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut newest: Option<NaiveDate> = None;
    for raw in dates {
        let parsed = parse_business_date(raw);
        let date = match parsed {
            Some(d) => d,
            None => {
                if !raw.trim().is_empty() {
                    log::warn!("Skipping unparseable document date {:?}", raw);
                }
                continue;
            }
        };
        if newest.map_or(true, |cur| date > cur) {
            newest = Some(date);
        }
    }
    newest.map(|d| d.format("%Y-%m-%d").to_string())
}

/// Accept bare dates and datetime strings with a date prefix.
fn parse_business_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if raw.len() >= 10 {
        if let Ok(date) = NaiveDate::parse_from_str(&raw[..10], "%Y-%m-%d") {
            return Some(date);
        }
    }
    None
}
