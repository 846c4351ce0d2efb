//! Company ↔ invoicing-customer match scoring.
//!
//! Scoring is rule-based, not string-distance-based: the records describe
//! the same small-business universe, so exact and containment comparisons
//! over normalized names plus a phone check outperform fuzzy metrics here.
//! Every applicable rule is evaluated and the maximum kept — the phone rule
//! can only raise a score, never lower one.

use crate::db::DbCompany;
use crate::invoicing::InvoiceCustomer;

/// Exact normalized company-name match.
pub const SCORE_NAME_EXACT: u8 = 100;
/// One normalized name contains the other.
pub const SCORE_NAME_SUBSTRING: u8 = 80;
/// Customer's personal name equals the company name (sole proprietor).
pub const SCORE_PERSON_AS_COMPANY: u8 = 75;
/// Customer's personal name equals the CRM contact name.
pub const SCORE_PERSON_AS_CONTACT: u8 = 70;
/// Last-10-digit phone agreement. Floor, not cap: raises lower name scores
/// to 90 but never pulls an exact name match down.
pub const SCORE_PHONE: u8 = 90;

/// Acceptance thresholds. `found` gates single-company match lookups;
/// `suggest` gates the bulk triage queue. They are close but deliberately
/// distinct — do not unify them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchThresholds {
    pub found: u8,
    pub suggest: u8,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self { found: 60, suggest: 70 }
    }
}

/// Normalize a string for comparison: lowercase, trimmed.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Normalize a phone number: digits only, keeping the last 10. Handles
/// country-code prefixes and formatting noise.
pub fn normalize_phone(value: &str) -> String {
    let digits: Vec<char> = value.chars().filter(|c| c.is_ascii_digit()).collect();
    let skip = digits.len().saturating_sub(10);
    digits[skip..].iter().collect()
}

/// Confidence 0–100 that `company` and `customer` are the same business.
///
/// Empty strings never match anything — two blank fields comparing equal is
/// guarded out of every rule.
pub fn score(company: &DbCompany, customer: &InvoiceCustomer) -> u8 {
    let company_name = normalize(&company.name);
    let customer_company = normalize(&customer.company_name);
    let contact_name = normalize(company.contact_name.as_deref().unwrap_or(""));
    let person_name = normalize(&customer.full_name());

    let mut best = 0u8;

    if !company_name.is_empty() && !customer_company.is_empty() {
        if company_name == customer_company {
            best = SCORE_NAME_EXACT;
        } else if customer_company.contains(&company_name)
            || company_name.contains(&customer_company)
        {
            best = best.max(SCORE_NAME_SUBSTRING);
        }
    }

    if !person_name.is_empty() {
        if !company_name.is_empty() && person_name == company_name {
            best = best.max(SCORE_PERSON_AS_COMPANY);
        }
        if !contact_name.is_empty() && person_name == contact_name {
            best = best.max(SCORE_PERSON_AS_CONTACT);
        }
    }

    let company_phone = normalize_phone(company.phone.as_deref().unwrap_or(""));
    let customer_phone = normalize_phone(customer.phone.as_deref().unwrap_or(""));
    if !company_phone.is_empty() && !customer_phone.is_empty() && company_phone == customer_phone {
        best = best.max(SCORE_PHONE);
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::companies::test_fixtures::company;

    fn customer(company_name: &str, first: &str, last: &str, phone: Option<&str>) -> InvoiceCustomer {
        InvoiceCustomer {
            id: "cust-1".to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            company_name: company_name.to_string(),
            phone: phone.map(|p| p.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_phone_keeps_last_ten_digits() {
        assert_eq!(normalize_phone("(302) 555-1212"), "3025551212");
        assert_eq!(normalize_phone("+1 302 555 1212"), "3025551212");
        assert_eq!(normalize_phone("555-1212"), "5551212");
        assert_eq!(normalize_phone("no digits"), "");
    }

    #[test]
    fn test_exact_name_match_scores_ceiling() {
        // Phone agreement is consistent but the name rule already yields 100.
        let mut acme = company("co-1", "Acme Fence Co");
        acme.phone = Some("302-555-1212".to_string());
        let cust = customer("ACME FENCE CO", "", "", Some("(302) 555-1212"));
        assert_eq!(score(&acme, &cust), 100);
    }

    #[test]
    fn test_substring_match_either_direction() {
        let acme = company("co-1", "Acme");
        assert_eq!(score(&acme, &customer("Acme Fencing LLC", "", "", None)), 80);

        let long = company("co-2", "Acme Fencing LLC");
        assert_eq!(score(&long, &customer("acme", "", "", None)), 80);
    }

    #[test]
    fn test_person_name_rules() {
        let mut shop = company("co-1", "Riverside Decks");
        shop.contact_name = Some("Dana Voss".to_string());
        assert_eq!(score(&shop, &customer("", "dana", "voss", None)), 70);

        // Sole proprietor: personal name IS the company name
        let solo = company("co-2", "Dana Voss");
        assert_eq!(score(&solo, &customer("", "Dana", "Voss", None)), 75);
    }

    #[test]
    fn test_phone_only_raises_never_lowers() {
        // Phone raises a 70 to 90
        let mut shop = company("co-1", "Riverside Decks");
        shop.contact_name = Some("Dana Voss".to_string());
        shop.phone = Some("302-555-8800".to_string());
        let cust = customer("", "Dana", "Voss", Some("3025558800"));
        assert_eq!(score(&shop, &cust), 90);

        // Phone does not pull an exact name match down to 90
        let mut acme = company("co-2", "Acme");
        acme.phone = Some("302-555-8800".to_string());
        let cust = customer("Acme", "", "", Some("302-555-8800"));
        assert_eq!(score(&acme, &cust), 100);
    }

    #[test]
    fn test_empty_fields_never_match() {
        let blank = company("co-1", "");
        assert_eq!(score(&blank, &customer("", "", "", None)), 0);

        // Two empty phones are not a phone match
        let mut named = company("co-2", "Acme");
        named.phone = Some("".to_string());
        let mut cust = customer("Unrelated Plumbing", "", "", Some(""));
        assert_eq!(score(&named, &cust), 0);

        // Empty contact name does not equal empty person name
        cust.company_name = "".to_string();
        assert_eq!(score(&named, &cust), 0);
    }

    #[test]
    fn test_unrelated_records_score_zero() {
        let acme = company("co-1", "Acme Fence Co");
        assert_eq!(score(&acme, &customer("Riverside Plumbing", "Pat", "Kim", Some("555-0000"))), 0);
    }

    #[test]
    fn test_max_of_rules_not_first_match() {
        // Substring (80) and person-as-contact (70) both fire; max wins.
        let mut shop = company("co-1", "Voss");
        shop.contact_name = Some("Dana Voss".to_string());
        let cust = customer("Voss Fencing", "Dana", "Voss", None);
        assert_eq!(score(&shop, &cust), 80);
    }

    #[test]
    fn test_default_thresholds_are_distinct() {
        let thresholds = MatchThresholds::default();
        assert_eq!(thresholds.found, 60);
        assert_eq!(thresholds.suggest, 70);
    }
}
