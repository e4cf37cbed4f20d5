//! `SQLite` persistence
//!
//! [`Store`] owns the connection. Each submodule adds the queries for one
//! group of records as a further `impl Store` block.

mod departments;
mod feedback;
mod modules;
mod results;
pub mod schema;
mod students;
mod tutees;

pub use students::StudentFilter;

use rusqlite::{ffi, Connection, ErrorCode, OptionalExtension};
use std::path::Path;

use crate::calendar;
use crate::{debug, info};
use crate::{Error, Result};

const CURRENT_YEAR: &str = "current_year";
const SCHEMA_VERSION: &str = "schema_version";

/// Handle on a `NomosDB` database
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database file at `path`
    ///
    /// # Errors
    /// Fails when the file cannot be opened or the schema cannot be applied.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self {
            conn: Connection::open(path)?,
        };
        store.migrate()?;
        info!("Database opened: {}", path.display());
        Ok(store)
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    /// Fails when the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        self.conn.execute_batch(schema::SCHEMA)?;
        let expected = schema::SCHEMA_VERSION.to_string();
        match self.get_setting(SCHEMA_VERSION)? {
            None => {
                self.set_setting(SCHEMA_VERSION, &expected)?;
                debug!("Schema version {expected} created");
            }
            Some(version) if version == expected => {}
            Some(version) => {
                return Err(Error::invalid(
                    "database",
                    format!("schema version {version} is not supported (expected {expected})"),
                ));
            }
        }
        Ok(())
    }

    /// Raw connection, for callers that need their own queries
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside one transaction, committing only when it succeeds
    ///
    /// # Errors
    /// Returns the error from `f` or from beginning or committing the
    /// transaction. Nothing is written in that case.
    ///
    /// Inside an open transaction `f` simply joins it.
    pub fn in_transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        if !self.conn.is_autocommit() {
            return f(self);
        }
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    /// Stored setting by name
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn get_setting(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT value FROM settings WHERE name = ?1", [name], |row| {
                row.get(0)
            })
            .optional()?)
    }

    /// Store a setting, replacing any previous value
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn set_setting(&self, name: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            [name, value],
        )?;
        Ok(())
    }

    /// Academic year the department operates in
    ///
    /// Falls back to the academic year of today's date until one is set.
    ///
    /// # Errors
    /// Fails on a database error or an unparsable stored value.
    pub fn current_year(&self) -> Result<i32> {
        match self.get_setting(CURRENT_YEAR)? {
            Some(value) => value.parse().map_err(|_| {
                Error::invalid("current_year", format!("'{value}' is not a year"))
            }),
            None => Ok(calendar::current_academic_year()),
        }
    }

    /// Change the current academic year
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn set_current_year(&self, year: i32) -> Result<()> {
        self.set_setting(CURRENT_YEAR, &year.to_string())?;
        info!("Current year set to {}", calendar::academic_year_string(year));
        Ok(())
    }
}

/// Turn a uniqueness violation into [`Error::Duplicate`]
fn unique_or(err: rusqlite::Error, entity: &'static str, key: &str) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _)
            if e.code == ErrorCode::ConstraintViolation
                && matches!(
                    e.extended_code,
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                ) =>
        {
            Error::duplicate(entity, key)
        }
        other => Error::Database(other),
    }
}

/// Insert or delete link rows so that `owner` is linked to exactly `values`
fn replace_links(
    conn: &Connection,
    table: &str,
    owner_column: &str,
    value_column: &str,
    owner: &dyn rusqlite::ToSql,
    values: &[String],
) -> Result<()> {
    conn.execute(
        &format!("DELETE FROM {table} WHERE {owner_column} = ?1"),
        [owner],
    )?;
    let mut stmt = conn.prepare(&format!(
        "INSERT OR IGNORE INTO {table} ({owner_column}, {value_column}) VALUES (?1, ?2)"
    ))?;
    for value in values {
        stmt.execute(rusqlite::params![owner, value])?;
    }
    Ok(())
}

/// Values linked to `owner`, sorted
fn load_links(
    conn: &Connection,
    table: &str,
    owner_column: &str,
    value_column: &str,
    owner: &dyn rusqlite::ToSql,
) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {value_column} FROM {table} WHERE {owner_column} = ?1 ORDER BY {value_column}"
    ))?;
    let values = stmt
        .query_map([owner], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(values)
}
