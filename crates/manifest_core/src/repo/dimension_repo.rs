//! Dimension mapper: `DimensionData` <-> dimension/quarter/month/task rows.
//!
//! # Responsibility
//! - Assemble one dimension aggregate from `dimension_data`,
//!   `quarterly_goals`, `monthly_tasks` and `tasks`.
//! - Write one dimension aggregate inside a caller-owned transaction.
//!
//! # Invariants
//! - Loaded goals/tasks always fill exactly 4/12 slots; rows whose quarter or
//!   month index is out of range are ignored.
//! - Saving writes all 4 quarter rows and replaces the whole month
//!   association set for `(year, dimension_key)`.
//! - Every task referenced by the saved aggregate is written too, so the
//!   `tasks` table agrees with what was just saved.
//! - This module never opens a transaction of its own.

use crate::model::dimension::{
    DimensionData, MonthlyTasks, QuarterlyGoals, MONTH_COUNT, QUARTER_COUNT,
};
use crate::model::task::TaskId;
use crate::repo::task_repo::{fetch_tasks_by_ids, write_task};
use crate::repo::{decode_settings, encode_settings, ensure_tables, RepoResult, WriteMode};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::collections::BTreeMap;

const DIMENSION_SELECT_SQL: &str = "SELECT
    dimension_key,
    annual_goal,
    total_score,
    completed_tasks,
    total_tasks,
    progress,
    settings
FROM dimension_data";

/// Read side of the dimension mapper.
pub struct SqliteDimensionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDimensionRepository<'conn> {
    /// Constructs a mapper from a bootstrapped connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &["dimension_data", "quarterly_goals", "monthly_tasks", "tasks"],
        )?;
        Ok(Self { conn })
    }

    /// Loads one dimension of one year; `None` when no `dimension_data` row.
    pub fn load_dimension(
        &self,
        year: &str,
        dimension_key: &str,
    ) -> RepoResult<Option<DimensionData>> {
        let row = self
            .conn
            .query_row(
                &format!("{DIMENSION_SELECT_SQL} WHERE year = ?1 AND dimension_key = ?2;"),
                params![year, dimension_key],
                read_dimension_row,
            )
            .optional()?;

        match row {
            Some(row) => Ok(Some(self.hydrate(year, row)?)),
            None => Ok(None),
        }
    }

    /// Loads every dimension stored for `year`, keyed by dimension key.
    pub fn list_dimensions(&self, year: &str) -> RepoResult<BTreeMap<String, DimensionData>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DIMENSION_SELECT_SQL} WHERE year = ?1 ORDER BY id ASC;"
        ))?;
        let rows = stmt
            .query_map([year], read_dimension_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut dimensions = BTreeMap::new();
        for row in rows {
            let key = row.dimension_key.clone();
            dimensions.insert(key, self.hydrate(year, row)?);
        }
        Ok(dimensions)
    }

    fn hydrate(&self, year: &str, row: DimensionRow) -> RepoResult<DimensionData> {
        let settings = decode_settings(&row.settings, "dimension_data", &row.dimension_key)?;
        Ok(DimensionData {
            annual_goal: row.annual_goal,
            quarterly_goals: load_quarterly_goals(self.conn, year, &row.dimension_key)?,
            monthly_tasks: load_monthly_tasks(self.conn, year, &row.dimension_key)?,
            total_score: row.total_score,
            completed_tasks: row.completed_tasks,
            total_tasks: row.total_tasks,
            progress: row.progress,
            settings,
        })
    }
}

/// Upserts one dimension aggregate inside `tx`.
///
/// The transaction is left open; committing is the caller's decision, which
/// lets a multi-dimension save succeed or fail as one unit.
pub fn save_dimension(
    tx: &Transaction<'_>,
    year: &str,
    dimension_key: &str,
    data: &DimensionData,
) -> RepoResult<()> {
    write_dimension(tx, year, dimension_key, data, WriteMode::Upsert)
}

pub(crate) fn write_dimension(
    tx: &Transaction<'_>,
    year: &str,
    dimension_key: &str,
    data: &DimensionData,
    mode: WriteMode,
) -> RepoResult<()> {
    let settings = encode_settings(&data.settings, "dimension_data", dimension_key)?;
    tx.execute(
        &format!(
            "{} dimension_data (
                year,
                dimension_key,
                annual_goal,
                total_score,
                completed_tasks,
                total_tasks,
                progress,
                settings
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            mode.verb()
        ),
        params![
            year,
            dimension_key,
            data.annual_goal.as_str(),
            data.total_score,
            data.completed_tasks,
            data.total_tasks,
            data.progress,
            settings,
        ],
    )?;

    for (quarter, goal) in data.quarterly_goals.iter().enumerate() {
        tx.execute(
            &format!(
                "{} quarterly_goals (year, dimension_key, quarter, goal) VALUES (?1, ?2, ?3, ?4);",
                mode.verb()
            ),
            params![year, dimension_key, quarter as i64, goal.as_str()],
        )?;
    }

    tx.execute(
        "DELETE FROM monthly_tasks WHERE year = ?1 AND dimension_key = ?2;",
        params![year, dimension_key],
    )?;

    // Tasks are shared across months, dimensions and years, so their rows and
    // links are upserted even under strict `Insert`.
    for (month, task) in data.tasks() {
        write_task(tx, task, WriteMode::Upsert)?;
        tx.execute(
            &format!(
                "{} monthly_tasks (year, dimension_key, month, task_id) VALUES (?1, ?2, ?3, ?4);",
                WriteMode::Upsert.verb()
            ),
            params![year, dimension_key, month as i64, task.id.as_str()],
        )?;
    }

    Ok(())
}

struct DimensionRow {
    dimension_key: String,
    annual_goal: String,
    total_score: f64,
    completed_tasks: i64,
    total_tasks: i64,
    progress: i64,
    settings: String,
}

fn read_dimension_row(row: &Row<'_>) -> rusqlite::Result<DimensionRow> {
    Ok(DimensionRow {
        dimension_key: row.get("dimension_key")?,
        annual_goal: row.get("annual_goal")?,
        total_score: row.get("total_score")?,
        completed_tasks: row.get("completed_tasks")?,
        total_tasks: row.get("total_tasks")?,
        progress: row.get("progress")?,
        settings: row.get("settings")?,
    })
}

fn load_quarterly_goals(
    conn: &Connection,
    year: &str,
    dimension_key: &str,
) -> RepoResult<QuarterlyGoals> {
    let mut goals = QuarterlyGoals::default();
    let mut stmt = conn.prepare(
        "SELECT quarter, goal
         FROM quarterly_goals
         WHERE year = ?1 AND dimension_key = ?2
         ORDER BY quarter ASC;",
    )?;
    let mut rows = stmt.query(params![year, dimension_key])?;
    while let Some(row) = rows.next()? {
        let quarter: i64 = row.get("quarter")?;
        if let Some(slot) = slot_index(quarter, QUARTER_COUNT) {
            goals[slot] = row.get("goal")?;
        }
    }
    Ok(goals)
}

fn load_monthly_tasks(
    conn: &Connection,
    year: &str,
    dimension_key: &str,
) -> RepoResult<MonthlyTasks> {
    let mut monthly = MonthlyTasks::default();
    let mut links: Vec<(usize, TaskId)> = Vec::new();

    let mut stmt = conn.prepare(
        "SELECT month, task_id
         FROM monthly_tasks
         WHERE year = ?1 AND dimension_key = ?2
         ORDER BY month ASC, id ASC;",
    )?;
    let mut rows = stmt.query(params![year, dimension_key])?;
    while let Some(row) = rows.next()? {
        let month: i64 = row.get("month")?;
        if let Some(slot) = slot_index(month, MONTH_COUNT) {
            links.push((slot, row.get("task_id")?));
        }
    }

    if links.is_empty() {
        return Ok(monthly);
    }

    let ids: Vec<TaskId> = links.iter().map(|(_, id)| id.clone()).collect();
    let tasks = fetch_tasks_by_ids(conn, &ids)?;
    for (slot, id) in links {
        // Dangling associations (task row deleted) are skipped.
        if let Some(task) = tasks.get(&id) {
            monthly[slot].push(task.clone());
        }
    }

    Ok(monthly)
}

fn slot_index(value: i64, len: usize) -> Option<usize> {
    usize::try_from(value).ok().filter(|index| *index < len)
}
