//! SQLite working store for companies, employees, users, and activities.
//!
//! The database lives at `~/.salesos/salesos.db`. The hosted relational
//! store of the production deployment is mirrored locally so the analytical
//! core can run over fast in-memory snapshots; all reads the engines consume
//! go through the fetch methods here, and write-backs (link enrichment,
//! CRUD) return through the same connection.

use std::path::PathBuf;

use chrono::Utc;
use rusqlite::{Connection, OpenFlags};
use uuid::Uuid;

pub mod activities;
pub mod companies;
pub mod employees;
pub mod types;
pub mod users;

pub use types::*;

pub struct CrmDb {
    conn: Connection,
}

impl CrmDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Self) -> Result<T, DbError>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(self) {
            Ok(val) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Open (or create) the database at `~/.salesos/salesos.db` and apply
    /// the schema.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::db_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path. Useful for testing.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;

        // FK enforcement after migrations — ALTER TABLE steps run with
        // whatever the connection default was.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let db = Self { conn };

        // Legacy data repair — idempotent, safe to run every startup.
        if let Err(e) = db.backfill_user_employee_links() {
            log::warn!("User/employee link backfill failed: {}", e);
        }

        Ok(db)
    }

    /// Open the database in read-only mode, for reporting tools that must
    /// not take the write lock.
    pub fn open_readonly() -> Result<Self, DbError> {
        let path = Self::db_path()?;
        Self::open_readonly_at(&path)
    }

    /// Open a database at an explicit path in read-only mode.
    pub fn open_readonly_at(path: &std::path::Path) -> Result<Self, DbError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database with the full schema. Test helper.
    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Self {
        let conn = Connection::open_in_memory().expect("in-memory db");
        crate::migrations::run_migrations(&conn).expect("migrations");
        conn.execute_batch("PRAGMA foreign_keys = ON;").expect("fk pragma");
        Self { conn }
    }

    /// Resolve the default database path: `~/.salesos/salesos.db`.
    fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".salesos").join("salesos.db"))
    }
}

// ---------------------------------------------------------------------------
// Id / timestamp helpers
// ---------------------------------------------------------------------------

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

pub fn new_company_id() -> String {
    format!("co-{}", Uuid::new_v4())
}

pub fn new_employee_id() -> String {
    format!("emp-{}", Uuid::new_v4())
}

pub fn new_activity_id() -> String {
    format!("act-{}", Uuid::new_v4())
}

pub fn new_user_id() -> String {
    format!("usr-{}", Uuid::new_v4())
}
