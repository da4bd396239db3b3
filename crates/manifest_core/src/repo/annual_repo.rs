//! Annual aggregate store: `AnnualData` <-> `annual_data` + `dimension_configs`.
//!
//! # Responsibility
//! - Load one year, or every year, as a full nested aggregate.
//! - Save and delete one year atomically, delegating dimension rows to the
//!   dimension mapper within the same transaction.
//!
//! # Invariants
//! - `get_annual_data` returns `Ok(None)` for an unknown year.
//! - Save is all-or-nothing; any failed statement rolls back the whole year.
//! - Delete removes every row keyed by the year except `tasks` rows, which
//!   are only removed by explicit task deletion.
//! - Reads run outside an explicit transaction.

use crate::model::annual::{AnnualData, AnnualSettings, SystemData};
use crate::model::dimension::DimensionConfig;
use crate::repo::dimension_repo::{write_dimension, SqliteDimensionRepository};
use crate::repo::{
    bool_to_int, decode_settings, encode_settings, ensure_tables, int_to_bool, RepoResult,
    WriteMode,
};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Repository interface for whole-year aggregates.
pub trait AnnualRepository {
    /// Loads every stored year, ascending by year key.
    fn list_annual_data(&self) -> RepoResult<SystemData>;
    /// Loads one year; `None` when the year is not stored.
    fn get_annual_data(&self, year: &str) -> RepoResult<Option<AnnualData>>;
    /// Upserts the year row, its dimension configs and every dimension.
    fn save_annual_data(&self, data: &AnnualData) -> RepoResult<()>;
    /// Removes every row belonging to `year`; tasks are kept.
    fn delete_annual_data(&self, year: &str) -> RepoResult<()>;
}

/// SQLite-backed annual aggregate store.
pub struct SqliteAnnualRepository<'conn> {
    conn: &'conn Connection,
    dimensions: SqliteDimensionRepository<'conn>,
}

impl<'conn> SqliteAnnualRepository<'conn> {
    /// Constructs a repository from a bootstrapped connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["annual_data", "dimension_configs"])?;
        Ok(Self {
            conn,
            dimensions: SqliteDimensionRepository::try_new(conn)?,
        })
    }

    fn assemble(&self, year: String, total_score: f64, settings: &str) -> RepoResult<AnnualData> {
        let settings: AnnualSettings = decode_settings(settings, "annual_data", &year)?;
        let dimension_configs = load_dimension_configs(self.conn, &year)?;
        let dimensions = self.dimensions.list_dimensions(&year)?;
        Ok(AnnualData {
            year,
            total_score,
            settings,
            dimension_configs,
            dimensions,
        })
    }
}

impl AnnualRepository for SqliteAnnualRepository<'_> {
    fn list_annual_data(&self) -> RepoResult<SystemData> {
        let mut stmt = self
            .conn
            .prepare("SELECT year, total_score, settings FROM annual_data ORDER BY year ASC;")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>("year")?,
                    row.get::<_, f64>("total_score")?,
                    row.get::<_, String>("settings")?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut system = SystemData::new();
        for (year, total_score, settings) in rows {
            let annual = self.assemble(year.clone(), total_score, &settings)?;
            system.insert(year, annual);
        }
        Ok(system)
    }

    fn get_annual_data(&self, year: &str) -> RepoResult<Option<AnnualData>> {
        let row = self
            .conn
            .query_row(
                "SELECT total_score, settings FROM annual_data WHERE year = ?1;",
                [year],
                |row| Ok((row.get::<_, f64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        match row {
            Some((total_score, settings)) => {
                Ok(Some(self.assemble(year.to_string(), total_score, &settings)?))
            }
            None => Ok(None),
        }
    }

    fn save_annual_data(&self, data: &AnnualData) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        write_annual(&tx, &data.year, data, WriteMode::Upsert)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_annual_data(&self, year: &str) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        // Children before parent.
        for table in [
            "monthly_tasks",
            "quarterly_goals",
            "dimension_data",
            "dimension_configs",
            "annual_data",
        ] {
            tx.execute(&format!("DELETE FROM {table} WHERE year = ?1;"), [year])?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Writes one year aggregate under `year` inside `tx`.
///
/// `year` is passed separately because import keys years by the snapshot
/// map rather than by `AnnualData::year`.
pub(crate) fn write_annual(
    tx: &Transaction<'_>,
    year: &str,
    data: &AnnualData,
    mode: WriteMode,
) -> RepoResult<()> {
    let settings = encode_settings(&data.settings, "annual_data", year)?;
    tx.execute(
        &format!(
            "{} annual_data (year, total_score, settings) VALUES (?1, ?2, ?3);",
            mode.verb()
        ),
        params![year, data.total_score, settings],
    )?;

    for config in &data.dimension_configs {
        tx.execute(
            &format!(
                "{} dimension_configs (year, key, title, icon, color, is_default)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                mode.verb()
            ),
            params![
                year,
                config.key.as_str(),
                config.title.as_str(),
                config.icon.as_str(),
                config.color.as_str(),
                bool_to_int(config.is_default),
            ],
        )?;
    }

    for (dimension_key, dimension) in &data.dimensions {
        write_dimension(tx, year, dimension_key, dimension, mode)?;
    }

    Ok(())
}

fn load_dimension_configs(conn: &Connection, year: &str) -> RepoResult<Vec<DimensionConfig>> {
    let mut stmt = conn.prepare(
        "SELECT key, title, icon, color, is_default
         FROM dimension_configs
         WHERE year = ?1
         ORDER BY id ASC;",
    )?;
    let mut rows = stmt.query([year])?;
    let mut configs = Vec::new();
    while let Some(row) = rows.next()? {
        configs.push(DimensionConfig {
            key: row.get("key")?,
            title: row.get("title")?,
            icon: row.get("icon")?,
            color: row.get("color")?,
            is_default: int_to_bool(row.get::<_, Option<i64>>("is_default")?.unwrap_or(0)),
        });
    }
    Ok(configs)
}
