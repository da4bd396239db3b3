//! Planner use-case service.
//!
//! # Responsibility
//! - Provide the operation surface a UI bridge calls: whole-year load/save,
//!   task edits, reset, import/export and profile switching.
//! - Emit one metadata-only log event per operation.
//!
//! # Invariants
//! - Repository errors are returned unchanged; nothing here retries.
//! - Log lines never carry user text (titles, goals, descriptions).

use crate::model::account::Account;
use crate::model::annual::{AnnualData, SystemData};
use crate::model::task::{Task, TaskId};
use crate::repo::account_repo::{AccountRepository, SqliteAccountRepository};
use crate::repo::annual_repo::{AnnualRepository, SqliteAnnualRepository};
use crate::repo::system_repo::{SqliteSystemRepository, SystemRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::RepoResult;
use log::{error, info, warn};
use rusqlite::Connection;
use std::collections::HashMap;
use std::time::Instant;

/// Facade over the planning repositories sharing one store handle.
pub struct PlannerService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> PlannerService<'conn> {
    /// Creates a service over a connection returned by `db::open_db*`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Loads every stored year.
    pub fn get_all_annual_data(&self) -> RepoResult<SystemData> {
        observe(
            "annual_list",
            || SqliteAnnualRepository::try_new(self.conn)?.list_annual_data(),
            |system| format!("years={}", system.len()),
        )
    }

    /// Loads one year; `Ok(None)` when the year is not stored.
    pub fn get_annual_data(&self, year: &str) -> RepoResult<Option<AnnualData>> {
        observe(
            "annual_get",
            || SqliteAnnualRepository::try_new(self.conn)?.get_annual_data(year),
            |annual| format!("year={year} found={}", annual.is_some()),
        )
    }

    /// Saves one year atomically.
    pub fn save_annual_data(&self, data: &AnnualData) -> RepoResult<()> {
        let orphans = data.unconfigured_dimensions();
        if !orphans.is_empty() {
            warn!(
                "event=annual_save module=service status=warn year={} unconfigured_dimensions={}",
                data.year,
                orphans.len()
            );
        }

        observe(
            "annual_save",
            || SqliteAnnualRepository::try_new(self.conn)?.save_annual_data(data),
            |_| {
                format!(
                    "year={} dimensions={} tasks={}",
                    data.year,
                    data.dimensions.len(),
                    data.dimensions
                        .values()
                        .map(|dimension| dimension.task_count())
                        .sum::<usize>()
                )
            },
        )
    }

    /// Deletes one year; its tasks stay in the task table.
    pub fn delete_annual_data(&self, year: &str) -> RepoResult<()> {
        observe(
            "annual_delete",
            || SqliteAnnualRepository::try_new(self.conn)?.delete_annual_data(year),
            |_| format!("year={year}"),
        )
    }

    /// Stores a new task record.
    pub fn add_task(&self, task: &Task) -> RepoResult<()> {
        observe(
            "task_add",
            || SqliteTaskRepository::try_new(self.conn)?.upsert_task(task),
            |_| String::new(),
        )
    }

    /// Overwrites an existing task record; creates it when absent.
    pub fn update_task(&self, task: &Task) -> RepoResult<()> {
        observe(
            "task_update",
            || SqliteTaskRepository::try_new(self.conn)?.upsert_task(task),
            |_| String::new(),
        )
    }

    /// Deletes a task and every month association referencing it.
    pub fn delete_task(&self, task_id: &str) -> RepoResult<()> {
        observe(
            "task_delete",
            || SqliteTaskRepository::try_new(self.conn)?.delete_task(task_id),
            |_| String::new(),
        )
    }

    /// Looks up tasks by id; missing ids are absent from the result.
    pub fn fetch_tasks(&self, ids: &[TaskId]) -> RepoResult<HashMap<TaskId, Task>> {
        observe(
            "task_fetch",
            || SqliteTaskRepository::try_new(self.conn)?.fetch_tasks(ids),
            |tasks| format!("requested={} found={}", ids.len(), tasks.len()),
        )
    }

    /// Irreversibly wipes every table, profiles included.
    pub fn reset_all_data(&self) -> RepoResult<()> {
        observe(
            "system_reset",
            || SqliteSystemRepository::try_new(self.conn)?.reset_all(),
            |_| String::new(),
        )
    }

    /// Replaces the planning dataset with `data`; profiles are kept.
    pub fn import_data(&self, data: &SystemData) -> RepoResult<()> {
        observe(
            "system_import",
            || SqliteSystemRepository::try_new(self.conn)?.import_all(data),
            |_| format!("years={}", data.len()),
        )
    }

    /// Returns the complete planning dataset for export.
    pub fn export_data(&self) -> RepoResult<SystemData> {
        observe(
            "system_export",
            || SqliteSystemRepository::try_new(self.conn)?.export_all(),
            |system| format!("years={}", system.len()),
        )
    }

    pub fn get_accounts(&self) -> RepoResult<Vec<Account>> {
        observe(
            "account_list",
            || SqliteAccountRepository::try_new(self.conn)?.list_accounts(),
            |accounts| format!("accounts={}", accounts.len()),
        )
    }

    pub fn save_account(&self, account: &Account) -> RepoResult<()> {
        observe(
            "account_save",
            || SqliteAccountRepository::try_new(self.conn)?.save_account(account),
            |_| String::new(),
        )
    }

    pub fn new_account(&self, username: &str, avatar_path: &str) -> RepoResult<Account> {
        observe(
            "account_create",
            || SqliteAccountRepository::try_new(self.conn)?.create_account(username, avatar_path),
            |_| String::new(),
        )
    }

    pub fn switch_account(&self, account_id: &str) -> RepoResult<()> {
        observe(
            "account_switch",
            || SqliteAccountRepository::try_new(self.conn)?.switch_account(account_id),
            |_| String::new(),
        )
    }

    pub fn get_last_used_account(&self) -> RepoResult<Option<Account>> {
        observe(
            "account_last_used",
            || SqliteAccountRepository::try_new(self.conn)?.last_used_account(),
            |account| format!("found={}", account.is_some()),
        )
    }
}

fn observe<T>(
    event: &'static str,
    operation: impl FnOnce() -> RepoResult<T>,
    describe: impl FnOnce(&T) -> String,
) -> RepoResult<T> {
    let started_at = Instant::now();
    match operation() {
        Ok(value) => {
            let details = describe(&value);
            info!(
                "event={event} module=service status=ok duration_ms={}{}{}",
                started_at.elapsed().as_millis(),
                if details.is_empty() { "" } else { " " },
                details
            );
            Ok(value)
        }
        Err(err) => {
            error!(
                "event={event} module=service status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}
