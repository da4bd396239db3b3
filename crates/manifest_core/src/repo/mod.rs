//! Repository layer: relational mapping of the planning aggregates.
//!
//! # Responsibility
//! - Translate nested aggregates into flat rows and back.
//! - Own transaction boundaries for every multi-statement mutation.
//!
//! # Invariants
//! - Single-entity lookups return `Ok(None)` for absence, never an error.
//! - Errors from SQLite propagate unchanged; nothing here retries.
//! - A failed mutation leaves no partially applied rows behind.

use crate::db::DbError;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod account_repo;
pub mod annual_repo;
pub mod dimension_repo;
pub mod system_repo;
pub mod task_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for every repository operation.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error, including constraint violations.
    Db(DbError),
    /// A settings payload could not be encoded, or stored JSON is malformed.
    Settings {
        table: &'static str,
        key: String,
        source: serde_json::Error,
    },
    /// Connection was not bootstrapped with the planning schema.
    MissingRequiredTable(&'static str),
    /// Mutation targets an entity that does not exist.
    NotFound(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Settings { table, key, source } => {
                write!(f, "invalid settings payload in {table} for `{key}`: {source}")
            }
            Self::MissingRequiredTable(table) => {
                write!(f, "planning store requires table `{table}`")
            }
            Self::NotFound(id) => write!(f, "not found: {id}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Settings { source, .. } => Some(source),
            Self::MissingRequiredTable(_) => None,
            Self::NotFound(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl RepoError {
    /// Returns `true` for uniqueness/primary key conflicts raised by SQLite.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_constraint_violation())
    }
}

/// How aggregate rows are written.
///
/// `Upsert` overwrites a conflicting row in full; `Insert` fails on conflict
/// and is only used after a wipe, where any conflict is a payload error.
/// Task rows and month links are always upserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    Upsert,
    Insert,
}

impl WriteMode {
    pub(crate) fn verb(self) -> &'static str {
        match self {
            Self::Upsert => "INSERT OR REPLACE INTO",
            Self::Insert => "INSERT INTO",
        }
    }
}

pub(crate) fn encode_settings<T: Serialize>(
    value: &T,
    table: &'static str,
    key: &str,
) -> RepoResult<String> {
    serde_json::to_string(value).map_err(|source| RepoError::Settings {
        table,
        key: key.to_string(),
        source,
    })
}

pub(crate) fn decode_settings<T: DeserializeOwned>(
    raw: &str,
    table: &'static str,
    key: &str,
) -> RepoResult<T> {
    serde_json::from_str(raw).map_err(|source| RepoError::Settings {
        table,
        key: key.to_string(),
        source,
    })
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

// Only an exact 1 is true; anything else a foreign writer left behind reads as false.
pub(crate) fn int_to_bool(value: i64) -> bool {
    value == 1
}

pub(crate) fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for &table in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::{int_to_bool, WriteMode};

    #[test]
    fn write_mode_selects_conflict_policy() {
        assert_eq!(WriteMode::Upsert.verb(), "INSERT OR REPLACE INTO");
        assert_eq!(WriteMode::Insert.verb(), "INSERT INTO");
    }

    #[test]
    fn int_to_bool_treats_only_one_as_true() {
        assert!(int_to_bool(1));
        assert!(!int_to_bool(0));
        assert!(!int_to_bool(7));
        assert!(!int_to_bool(-1));
    }
}
