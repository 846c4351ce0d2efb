//! Employee CRUD.

use rusqlite::{params, Row};

use super::{now_rfc3339, CrmDb, DbEmployee, DbError};

fn map_employee_row(row: &Row) -> rusqlite::Result<DbEmployee> {
    Ok(DbEmployee {
        id: row.get(0)?,
        name: row.get(1)?,
        role: row.get(2)?,
        active: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl CrmDb {
    pub fn insert_employee(&self, employee: &DbEmployee) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO employees (id, name, role, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                employee.id,
                employee.name,
                employee.role,
                employee.active,
                employee.created_at,
                employee.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_employee(&self, id: &str) -> Result<Option<DbEmployee>, DbError> {
        let result = self.conn.query_row(
            "SELECT id, name, role, active, created_at, updated_at
             FROM employees WHERE id = ?1",
            [id],
            map_employee_row,
        );
        match result {
            Ok(employee) => Ok(Some(employee)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_all_employees(&self) -> Result<Vec<DbEmployee>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, role, active, created_at, updated_at
             FROM employees ORDER BY name COLLATE NOCASE",
        )?;
        let rows = stmt.query_map([], map_employee_row)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn update_employee(&self, employee: &DbEmployee) -> Result<(), DbError> {
        let changed = self.conn.execute(
            "UPDATE employees SET name = ?2, role = ?3, active = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                employee.id,
                employee.name,
                employee.role,
                employee.active,
                now_rfc3339(),
            ],
        )?;
        if changed == 0 {
            return Err(DbError::row_not_found("Employee", &employee.id));
        }
        Ok(())
    }

    /// Deactivate rather than delete — activities keep their author.
    pub fn deactivate_employee(&self, id: &str) -> Result<(), DbError> {
        let changed = self.conn.execute(
            "UPDATE employees SET active = 0, updated_at = ?2 WHERE id = ?1",
            params![id, now_rfc3339()],
        )?;
        if changed == 0 {
            return Err(DbError::row_not_found("Employee", id));
        }
        Ok(())
    }
}
