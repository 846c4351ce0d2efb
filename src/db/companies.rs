//! Company CRUD and link write-backs.

use rusqlite::{params, Row};

use super::{now_rfc3339, CrmDb, DbCompany, DbError};
use crate::db::types::{parse_notes_column, parse_tags_column};

const COMPANY_COLUMNS: &str = "id, name, company_type, contact_name, address, city, state, zip,
        phone, email, website, notes, is_customer, tags, follow_up_date, follow_up_note,
        last_order_date, last_estimate_date, external_customer_id, created_at, updated_at";

fn map_company_row(row: &Row) -> rusqlite::Result<DbCompany> {
    let id: String = row.get(0)?;
    let notes_raw: Option<String> = row.get(11)?;
    let tags_raw: Option<String> = row.get(13)?;
    Ok(DbCompany {
        notes: parse_notes_column(&id, notes_raw.as_deref()),
        tags: parse_tags_column(&id, tags_raw.as_deref()),
        id,
        name: row.get(1)?,
        company_type: row.get(2)?,
        contact_name: row.get(3)?,
        address: row.get(4)?,
        city: row.get(5)?,
        state: row.get(6)?,
        zip: row.get(7)?,
        phone: row.get(8)?,
        email: row.get(9)?,
        website: row.get(10)?,
        is_customer: row.get(12)?,
        follow_up_date: row.get(14)?,
        follow_up_note: row.get(15)?,
        last_order_date: row.get(16)?,
        last_estimate_date: row.get(17)?,
        external_customer_id: row.get(18)?,
        created_at: row.get(19)?,
        updated_at: row.get(20)?,
    })
}

fn notes_json(company: &DbCompany) -> String {
    serde_json::to_string(&company.notes).unwrap_or_else(|_| "[]".to_string())
}

fn tags_json(company: &DbCompany) -> String {
    let tags: Vec<&String> = company.tags.iter().collect();
    serde_json::to_string(&tags).unwrap_or_else(|_| "[]".to_string())
}

impl CrmDb {
    pub fn insert_company(&self, company: &DbCompany) -> Result<(), DbError> {
        self.conn.execute(
            &format!(
                "INSERT INTO companies ({}) VALUES
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                  ?17, ?18, ?19, ?20, ?21)",
                COMPANY_COLUMNS
            ),
            params![
                company.id,
                company.name,
                company.company_type,
                company.contact_name,
                company.address,
                company.city,
                company.state,
                company.zip,
                company.phone,
                company.email,
                company.website,
                notes_json(company),
                company.is_customer,
                tags_json(company),
                company.follow_up_date,
                company.follow_up_note,
                company.last_order_date,
                company.last_estimate_date,
                company.external_customer_id,
                company.created_at,
                company.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_company(&self, id: &str) -> Result<Option<DbCompany>, DbError> {
        let result = self
            .conn
            .query_row(
                &format!("SELECT {} FROM companies WHERE id = ?1", COMPANY_COLUMNS),
                [id],
                map_company_row,
            );
        match result {
            Ok(company) => Ok(Some(company)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_all_companies(&self) -> Result<Vec<DbCompany>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM companies ORDER BY name COLLATE NOCASE",
            COMPANY_COLUMNS
        ))?;
        let rows = stmt.query_map([], map_company_row)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Full-row update. `updated_at` is stamped here, not taken from the
    /// caller's copy.
    pub fn update_company(&self, company: &DbCompany) -> Result<(), DbError> {
        let changed = self.conn.execute(
            "UPDATE companies SET
                name = ?2, company_type = ?3, contact_name = ?4, address = ?5,
                city = ?6, state = ?7, zip = ?8, phone = ?9, email = ?10,
                website = ?11, notes = ?12, is_customer = ?13, tags = ?14,
                follow_up_date = ?15, follow_up_note = ?16, last_order_date = ?17,
                last_estimate_date = ?18, external_customer_id = ?19, updated_at = ?20
             WHERE id = ?1",
            params![
                company.id,
                company.name,
                company.company_type,
                company.contact_name,
                company.address,
                company.city,
                company.state,
                company.zip,
                company.phone,
                company.email,
                company.website,
                notes_json(company),
                company.is_customer,
                tags_json(company),
                company.follow_up_date,
                company.follow_up_note,
                company.last_order_date,
                company.last_estimate_date,
                company.external_customer_id,
                now_rfc3339(),
            ],
        )?;
        if changed == 0 {
            return Err(DbError::row_not_found("Company", &company.id));
        }
        Ok(())
    }

    /// Delete a company and cascade-delete its activities in one
    /// transaction. The store does not filter orphans for us.
    pub fn delete_company(&self, id: &str) -> Result<(), DbError> {
        self.with_transaction(|db| {
            db.conn
                .execute("DELETE FROM activities WHERE company_id = ?1", [id])?;
            let changed = db.conn.execute("DELETE FROM companies WHERE id = ?1", [id])?;
            if changed == 0 {
                return Err(DbError::row_not_found("Company", id));
            }
            Ok(())
        })
    }

    /// Prepend a note, preserving newest-first ordering.
    pub fn append_company_note(
        &self,
        id: &str,
        author: &str,
        text: &str,
    ) -> Result<(), DbError> {
        let mut company = self
            .get_company(id)?
            .ok_or_else(|| DbError::row_not_found("Company", id))?;
        company.notes.insert(
            0,
            super::CompanyNote {
                author: author.to_string(),
                text: text.to_string(),
                timestamp: now_rfc3339(),
            },
        );
        self.update_company(&company)
    }

    /// Clear the invoicing link. Previously-copied fields and the type
    /// transition stay — enrichment is one-way.
    pub fn clear_external_link(&self, id: &str) -> Result<(), DbError> {
        let changed = self.conn.execute(
            "UPDATE companies SET external_customer_id = NULL, updated_at = ?2 WHERE id = ?1",
            params![id, now_rfc3339()],
        )?;
        if changed == 0 {
            return Err(DbError::row_not_found("Company", id));
        }
        Ok(())
    }

    /// Companies whose follow-up date has arrived.
    pub fn companies_due_for_follow_up(&self, on_or_before: &str) -> Result<Vec<DbCompany>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM companies
             WHERE follow_up_date IS NOT NULL AND follow_up_date <= ?1
             ORDER BY follow_up_date",
            COMPANY_COLUMNS
        ))?;
        let rows = stmt.query_map([on_or_before], map_company_row)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // -----------------------------------------------------------------------
    // Enrichment audit trail
    // -----------------------------------------------------------------------

    pub fn insert_enrichment_log(
        &self,
        company_id: &str,
        event_type: &str,
        external_customer_id: Option<&str>,
        fields_updated: &[String],
    ) -> Result<(), DbError> {
        let id = format!("el-{}", uuid::Uuid::new_v4());
        let fields_json =
            serde_json::to_string(fields_updated).unwrap_or_else(|_| "[]".to_string());
        self.conn.execute(
            "INSERT INTO enrichment_log
                (id, company_id, event_type, external_customer_id, fields_updated, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, company_id, event_type, external_customer_id, fields_json, now_rfc3339()],
        )?;
        Ok(())
    }

    /// Audit history for one company, newest first.
    pub fn get_enrichment_log(&self, company_id: &str) -> Result<Vec<super::DbEnrichmentLog>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, event_type, external_customer_id, fields_updated, created_at
             FROM enrichment_log WHERE company_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([company_id], |row| {
            let fields_raw: String = row.get(4)?;
            Ok(super::DbEnrichmentLog {
                id: row.get(0)?,
                company_id: row.get(1)?,
                event_type: row.get(2)?,
                external_customer_id: row.get(3)?,
                fields_updated: serde_json::from_str(&fields_raw).unwrap_or_default(),
                created_at: row.get(5)?,
            })
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use std::collections::BTreeSet;

    use super::*;

    /// Minimal company row for tests. Everything optional left empty.
    pub fn company(id: &str, name: &str) -> DbCompany {
        DbCompany {
            id: id.to_string(),
            name: name.to_string(),
            company_type: "Prospect".to_string(),
            contact_name: None,
            address: None,
            city: None,
            state: None,
            zip: None,
            phone: None,
            email: None,
            website: None,
            notes: Vec::new(),
            is_customer: false,
            tags: BTreeSet::new(),
            follow_up_date: None,
            follow_up_note: None,
            last_order_date: None,
            last_estimate_date: None,
            external_customer_id: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_fixtures::company;
    use super::*;

    #[test]
    fn test_insert_and_get_round_trip() {
        let db = CrmDb::open_in_memory();
        let mut acme = company("co-1", "Acme Fence Co");
        acme.phone = Some("302-555-1212".to_string());
        acme.tags.insert("fence".to_string());
        db.insert_company(&acme).unwrap();

        let loaded = db.get_company("co-1").unwrap().unwrap();
        assert_eq!(loaded.name, "Acme Fence Co");
        assert_eq!(loaded.phone.as_deref(), Some("302-555-1212"));
        assert!(loaded.tags.contains("fence"));
        assert!(db.get_company("co-missing").unwrap().is_none());
    }

    #[test]
    fn test_note_append_is_newest_first() {
        let db = CrmDb::open_in_memory();
        db.insert_company(&company("co-1", "Acme")).unwrap();
        db.append_company_note("co-1", "kim", "first").unwrap();
        db.append_company_note("co-1", "kim", "second").unwrap();

        let loaded = db.get_company("co-1").unwrap().unwrap();
        assert_eq!(loaded.notes.len(), 2);
        assert_eq!(loaded.notes[0].text, "second");
        assert_eq!(loaded.notes[1].text, "first");
    }

    #[test]
    fn test_update_missing_company_is_not_found() {
        let db = CrmDb::open_in_memory();
        let ghost = company("co-ghost", "Ghost");
        let err = db.update_company(&ghost).unwrap_err();
        assert!(matches!(err, DbError::RowNotFound { .. }));
    }

    #[test]
    fn test_delete_cascades_activities() {
        let db = CrmDb::open_in_memory();
        db.insert_company(&company("co-1", "Acme")).unwrap();
        db.insert_employee(&crate::db::employees::test_fixtures::employee("emp-1", "Jo"))
            .unwrap();
        let activity = crate::db::activities::test_fixtures::call("act-1", "co-1", "emp-1", "2024-03-05");
        db.insert_activity(&activity).unwrap();

        db.delete_company("co-1").unwrap();
        assert!(db.get_company("co-1").unwrap().is_none());
        let count: i64 = db
            .conn_ref()
            .query_row("SELECT COUNT(*) FROM activities", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_clear_external_link_keeps_enriched_fields() {
        let db = CrmDb::open_in_memory();
        let mut acme = company("co-1", "Acme");
        acme.external_customer_id = Some("cust-9".to_string());
        acme.phone = Some("302-555-0000".to_string());
        db.insert_company(&acme).unwrap();

        db.clear_external_link("co-1").unwrap();
        let loaded = db.get_company("co-1").unwrap().unwrap();
        assert!(loaded.external_customer_id.is_none());
        assert_eq!(loaded.phone.as_deref(), Some("302-555-0000"));
    }

    #[test]
    fn test_follow_up_query() {
        let db = CrmDb::open_in_memory();
        let mut due = company("co-1", "Due");
        due.follow_up_date = Some("2024-03-01".to_string());
        let mut later = company("co-2", "Later");
        later.follow_up_date = Some("2024-06-01".to_string());
        db.insert_company(&due).unwrap();
        db.insert_company(&later).unwrap();
        db.insert_company(&company("co-3", "None")).unwrap();

        let hits = db.companies_due_for_follow_up("2024-03-15").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "co-1");
    }

    #[test]
    fn test_enrichment_log_round_trip() {
        let db = CrmDb::open_in_memory();
        db.insert_company(&company("co-1", "Acme")).unwrap();
        db.insert_enrichment_log(
            "co-1",
            "link",
            Some("cust-9"),
            &["phone".to_string(), "email".to_string()],
        )
        .unwrap();

        let entries = db.get_enrichment_log("co-1").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event_type, "link");
        assert_eq!(entries[0].external_customer_id.as_deref(), Some("cust-9"));
        assert_eq!(entries[0].fields_updated, vec!["phone", "email"]);
    }

    #[test]
    fn test_malformed_tags_column_degrades_on_read() {
        let db = CrmDb::open_in_memory();
        db.insert_company(&company("co-1", "Acme")).unwrap();
        db.conn_ref()
            .execute("UPDATE companies SET tags = '{broken', notes = 'nope' WHERE id = 'co-1'", [])
            .unwrap();

        let loaded = db.get_company("co-1").unwrap().unwrap();
        assert!(loaded.tags.is_empty());
        assert!(loaded.notes.is_empty());
    }
}
