//! Activity log CRUD and date-range queries.

use chrono::NaiveDate;
use rusqlite::{params, Row};

use super::{CrmDb, DbActivity, DbError};
use crate::db::types::ActivityKind;
use crate::types::DateRange;

const ACTIVITY_COLUMNS: &str = "id, company_id, employee_id, activity_type, answered,
        interested, follow_up, notes, activity_date, created_at";

fn map_activity_row(row: &Row) -> rusqlite::Result<DbActivity> {
    let kind_raw: String = row.get(3)?;
    Ok(DbActivity {
        id: row.get(0)?,
        company_id: row.get(1)?,
        employee_id: row.get(2)?,
        kind: ActivityKind::parse(&kind_raw),
        answered: row.get(4)?,
        interested: row.get(5)?,
        follow_up: row.get(6)?,
        notes: row.get(7)?,
        date: row.get(8)?,
        created_at: row.get(9)?,
    })
}

impl CrmDb {
    /// Insert an activity. The referenced company and employee must exist,
    /// and the business date must be zero-padded ISO (YYYY-MM-DD) — date
    /// ordering elsewhere depends on that invariant.
    pub fn insert_activity(&self, activity: &DbActivity) -> Result<(), DbError> {
        if NaiveDate::parse_from_str(&activity.date, "%Y-%m-%d").is_err() {
            return Err(DbError::InvalidDate(activity.date.clone()));
        }
        if self.get_company(&activity.company_id)?.is_none() {
            return Err(DbError::row_not_found("Company", &activity.company_id));
        }
        if self.get_employee(&activity.employee_id)?.is_none() {
            return Err(DbError::row_not_found("Employee", &activity.employee_id));
        }

        self.conn.execute(
            &format!(
                "INSERT INTO activities ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                ACTIVITY_COLUMNS
            ),
            params![
                activity.id,
                activity.company_id,
                activity.employee_id,
                activity.kind.as_str(),
                activity.answered,
                activity.interested,
                activity.follow_up,
                activity.notes,
                activity.date,
                activity.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_activity(&self, id: &str) -> Result<Option<DbActivity>, DbError> {
        let result = self.conn.query_row(
            &format!("SELECT {} FROM activities WHERE id = ?1", ACTIVITY_COLUMNS),
            [id],
            map_activity_row,
        );
        match result {
            Ok(activity) => Ok(Some(activity)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All activities, optionally bounded by an inclusive business-date
    /// range. Ordered newest business date first.
    pub fn get_activities(&self, range: Option<&DateRange>) -> Result<Vec<DbActivity>, DbError> {
        let (start, end) = range_bounds(range);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM activities
             WHERE activity_date >= ?1 AND activity_date <= ?2
             ORDER BY activity_date DESC, created_at DESC",
            ACTIVITY_COLUMNS
        ))?;
        let rows = stmt.query_map(params![start, end], map_activity_row)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn get_activities_for_company(&self, company_id: &str) -> Result<Vec<DbActivity>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM activities WHERE company_id = ?1
             ORDER BY activity_date DESC, created_at DESC",
            ACTIVITY_COLUMNS
        ))?;
        let rows = stmt.query_map([company_id], map_activity_row)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn delete_activity(&self, id: &str) -> Result<(), DbError> {
        let changed = self.conn.execute("DELETE FROM activities WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(DbError::row_not_found("Activity", id));
        }
        Ok(())
    }
}

/// Translate an optional range into lexicographic bounds for the ISO-date
/// column. Open bounds use sentinels that sort outside any real date.
fn range_bounds(range: Option<&DateRange>) -> (String, String) {
    let start = range
        .and_then(|r| r.start)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "0000-00-00".to_string());
    let end = range
        .and_then(|r| r.end)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "9999-99-99".to_string());
    (start, end)
}
