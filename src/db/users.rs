//! Login accounts and their employee link.
//!
//! The production system historically associated a login with an employee by
//! comparing display names. That association is now an explicit
//! `users.employee_id` reference; `backfill_user_employee_links` migrates
//! legacy rows once, on open, by the old name rule.

use rusqlite::{params, Row};

use super::{now_rfc3339, CrmDb, DbError, DbUser};

fn map_user_row(row: &Row) -> rusqlite::Result<DbUser> {
    Ok(DbUser {
        id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        employee_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Display-name normalization for the legacy backfill: lowercase, collapsed
/// inner whitespace.
fn normalize_display_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl CrmDb {
    pub fn insert_user(&self, user: &DbUser) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO users (id, email, display_name, employee_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                user.email,
                user.display_name,
                user.employee_id,
                user.created_at,
                user.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, id: &str) -> Result<Option<DbUser>, DbError> {
        let result = self.conn.query_row(
            "SELECT id, email, display_name, employee_id, created_at, updated_at
             FROM users WHERE id = ?1",
            [id],
            map_user_row,
        );
        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_user_for_employee(&self, employee_id: &str) -> Result<Option<DbUser>, DbError> {
        let result = self.conn.query_row(
            "SELECT id, email, display_name, employee_id, created_at, updated_at
             FROM users WHERE employee_id = ?1",
            [employee_id],
            map_user_row,
        );
        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set_user_employee(&self, user_id: &str, employee_id: Option<&str>) -> Result<(), DbError> {
        let changed = self.conn.execute(
            "UPDATE users SET employee_id = ?2, updated_at = ?3 WHERE id = ?1",
            params![user_id, employee_id, now_rfc3339()],
        )?;
        if changed == 0 {
            return Err(DbError::row_not_found("User", user_id));
        }
        Ok(())
    }

    /// Legacy repair: link users that still rely on display-name matching.
    ///
    /// Idempotent — only rows with NULL employee_id are considered, and a
    /// user is linked only when exactly one employee matches its normalized
    /// display name. Ambiguous names are left unlinked and logged.
    pub fn backfill_user_employee_links(&self) -> Result<usize, DbError> {
        let unlinked: Vec<DbUser> = {
            let mut stmt = self.conn.prepare(
                "SELECT id, email, display_name, employee_id, created_at, updated_at
                 FROM users WHERE employee_id IS NULL",
            )?;
            let rows = stmt.query_map([], map_user_row)?;
            rows.filter_map(|r| r.ok()).collect()
        };
        if unlinked.is_empty() {
            return Ok(0);
        }

        let employees = self.get_all_employees()?;
        let mut linked = 0usize;
        for user in &unlinked {
            let key = normalize_display_name(&user.display_name);
            if key.is_empty() {
                continue;
            }
            let matches: Vec<&str> = employees
                .iter()
                .filter(|e| normalize_display_name(&e.name) == key)
                .map(|e| e.id.as_str())
                .collect();
            match matches.as_slice() {
                [employee_id] => {
                    self.set_user_employee(&user.id, Some(employee_id))?;
                    linked += 1;
                }
                [] => {}
                _ => {
                    log::warn!(
                        "User {} display name matches {} employees, leaving unlinked",
                        user.id,
                        matches.len()
                    );
                }
            }
        }
        if linked > 0 {
            log::info!("Backfilled {} user/employee links from legacy display names", linked);
        }
        Ok(linked)
    }
}
