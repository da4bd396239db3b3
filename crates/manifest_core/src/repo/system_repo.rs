//! Whole-store operations: reset, import and export.
//!
//! # Responsibility
//! - Wipe or replace the complete planning dataset in one transaction.
//!
//! # Invariants
//! - `reset_all` empties every table, accounts and config included.
//! - `import_all` wipes planning tables only; accounts and config survive.
//! - Import writes years, configs, dimension rows and quarters with strict
//!   inserts: a key repeated there fails the import and leaves the previous
//!   dataset intact. Tasks may be linked from several months, so task rows
//!   and month links are upserted.

use crate::model::annual::SystemData;
use crate::repo::annual_repo::{write_annual, AnnualRepository, SqliteAnnualRepository};
use crate::repo::{ensure_tables, RepoResult, WriteMode};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Tables holding the planning dataset, children first.
const PLANNING_TABLES: &[&str] = &[
    "tasks",
    "monthly_tasks",
    "quarterly_goals",
    "dimension_data",
    "dimension_configs",
    "annual_data",
];

/// Tables wiped in addition to the planning dataset on a full reset.
const PROFILE_TABLES: &[&str] = &["accounts", "config"];

/// Repository interface for whole-store operations.
pub trait SystemRepository {
    /// Deletes every row from every table.
    fn reset_all(&self) -> RepoResult<()>;
    /// Replaces the planning dataset with `data`.
    fn import_all(&self, data: &SystemData) -> RepoResult<()>;
    /// Returns the full planning dataset.
    fn export_all(&self) -> RepoResult<SystemData>;
}

/// SQLite-backed whole-store operations.
pub struct SqliteSystemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSystemRepository<'conn> {
    /// Constructs a repository from a bootstrapped connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, PLANNING_TABLES)?;
        ensure_tables(conn, PROFILE_TABLES)?;
        Ok(Self { conn })
    }
}

impl SystemRepository for SqliteSystemRepository<'_> {
    fn reset_all(&self) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        wipe(&tx, PLANNING_TABLES)?;
        wipe(&tx, PROFILE_TABLES)?;
        tx.commit()?;
        Ok(())
    }

    fn import_all(&self, data: &SystemData) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        wipe(&tx, PLANNING_TABLES)?;
        for (year, annual) in data {
            write_annual(&tx, year, annual, WriteMode::Insert)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn export_all(&self) -> RepoResult<SystemData> {
        SqliteAnnualRepository::try_new(self.conn)?.list_annual_data()
    }
}

fn wipe(tx: &Transaction<'_>, tables: &[&str]) -> RepoResult<()> {
    for table in tables {
        tx.execute(&format!("DELETE FROM {table};"), [])?;
    }
    Ok(())
}
