//! Core persistence for Manifest, a yearly goal planner.
//!
//! Years hold dimensions; dimensions hold four quarterly goals and twelve
//! monthly task lists. This crate maps that nested document onto SQLite and
//! back, one transaction per mutation.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::account::Account;
pub use model::annual::{AnnualData, AnnualSettings, SystemData};
pub use model::dimension::{
    DimensionConfig, DimensionData, DimensionSettings, MonthlyTasks, QuarterlyGoals,
    ScoringSettings, MONTH_COUNT, QUARTER_COUNT,
};
pub use model::task::{Task, TaskId};
pub use repo::account_repo::{AccountRepository, SqliteAccountRepository};
pub use repo::annual_repo::{AnnualRepository, SqliteAnnualRepository};
pub use repo::dimension_repo::{save_dimension, SqliteDimensionRepository};
pub use repo::system_repo::{SqliteSystemRepository, SystemRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::{RepoError, RepoResult};
pub use service::planner_service::PlannerService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
