//! Database layer for the front desk.

mod schema;
mod users;
mod patients;
mod vitals;
mod appointments;
mod queue;
mod consultations;
mod billing;

pub use billing::UNKNOWN_DOCTOR;
pub use schema::*;
pub use vitals::{MISSING_BLOOD_PRESSURE, UNKNOWN_RECORDER};

use rusqlite::{ffi, Connection};
use std::path::Path;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside one transaction. Any error rolls back every statement `f` issued.
    ///
    /// Must not be nested.
    pub fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<DbError>,
    {
        let tx = self.conn.unchecked_transaction().map_err(DbError::from)?;
        let value = f(self)?;
        tx.commit().map_err(DbError::from)?;
        Ok(value)
    }
}

/// Decode a stored enum string.
fn decode<T>(value: &str, parse: fn(&str) -> Option<T>, what: &str) -> DbResult<T> {
    parse(value).ok_or_else(|| DbError::Constraint(format!("Unknown {}: {}", what, value)))
}

/// Turn SQLite constraint failures into [`DbError::Constraint`] with a readable message.
fn constraint(err: rusqlite::Error, context: &str) -> DbError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) => match e.extended_code {
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                DbError::Constraint(format!("{}: referenced record does not exist", context))
            }
            ffi::SQLITE_CONSTRAINT_UNIQUE => {
                DbError::Constraint(format!("{}: duplicate value", context))
            }
            ffi::SQLITE_CONSTRAINT_NOTNULL | ffi::SQLITE_CONSTRAINT_CHECK => {
                DbError::Constraint(format!("{}: invalid value", context))
            }
            _ => DbError::Sqlite(err),
        },
        _ => DbError::Sqlite(err),
    }
}
