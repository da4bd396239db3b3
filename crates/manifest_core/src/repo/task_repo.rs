//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist individual task records keyed by caller-supplied ids.
//! - Resolve task ids referenced by month associations in batches.
//!
//! # Invariants
//! - Upsert is a full-row overwrite, never a partial patch.
//! - Deleting a task also removes every month association pointing at it.
//! - Missing ids are omitted from batch lookups, not reported as errors.

use crate::model::task::{Task, TaskId};
use crate::repo::{ensure_tables, RepoResult, WriteMode};
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::{BTreeSet, HashMap};

// Keeps bound parameters well under SQLITE_MAX_VARIABLE_NUMBER.
const FETCH_CHUNK_SIZE: usize = 500;

const TASK_COLUMNS: &str =
    "id, title, description, status, score, priority, start_date, end_date";

/// Repository interface for standalone task records.
pub trait TaskRepository {
    /// Inserts the task or replaces the existing row with the same id.
    fn upsert_task(&self, task: &Task) -> RepoResult<()>;
    /// Removes the task and its month associations. Absent ids are a no-op.
    fn delete_task(&self, id: &str) -> RepoResult<()>;
    /// Returns every requested task that exists, keyed by id.
    fn fetch_tasks(&self, ids: &[TaskId]) -> RepoResult<HashMap<TaskId, Task>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a bootstrapped connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["tasks", "monthly_tasks"])?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn upsert_task(&self, task: &Task) -> RepoResult<()> {
        write_task(self.conn, task, WriteMode::Upsert)
    }

    fn delete_task(&self, id: &str) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM monthly_tasks WHERE task_id = ?1;", [id])?;
        tx.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(())
    }

    fn fetch_tasks(&self, ids: &[TaskId]) -> RepoResult<HashMap<TaskId, Task>> {
        fetch_tasks_by_ids(self.conn, ids)
    }
}

/// Writes one task row on `conn`, which may be an open transaction.
pub(crate) fn write_task(conn: &Connection, task: &Task, mode: WriteMode) -> RepoResult<()> {
    conn.execute(
        &format!(
            "{} tasks ({TASK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            mode.verb()
        ),
        params![
            task.id.as_str(),
            task.title.as_str(),
            task.description.as_str(),
            task.status.as_str(),
            task.score,
            task.priority.as_str(),
            task.start_date.as_deref(),
            task.end_date.as_deref(),
        ],
    )?;
    Ok(())
}

/// Batch lookup shared by the repository and the dimension mapper.
///
/// An empty id list returns an empty map without touching the database.
pub(crate) fn fetch_tasks_by_ids(
    conn: &Connection,
    ids: &[TaskId],
) -> RepoResult<HashMap<TaskId, Task>> {
    let mut tasks = HashMap::new();
    if ids.is_empty() {
        return Ok(tasks);
    }

    let unique: Vec<&str> = ids
        .iter()
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    for chunk in unique.chunks(FETCH_CHUNK_SIZE) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id IN ({placeholders});"
        ))?;
        let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
        while let Some(row) = rows.next()? {
            let task = parse_task_row(row)?;
            tasks.insert(task.id.clone(), task);
        }
    }

    Ok(tasks)
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: row.get("status")?,
        score: row.get("score")?,
        priority: row.get("priority")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
    })
}
