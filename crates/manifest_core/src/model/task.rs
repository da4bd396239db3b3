//! Task record referenced from monthly slots.
//!
//! # Invariants
//! - `id` is caller-generated and globally unique.
//! - A task exists independently of any month association.
//! - Missing dates are `None`, never an empty string.

use serde::{Deserialize, Serialize};

/// Caller-supplied stable task identifier.
pub type TaskId = String;

/// One actionable item planned for a month of a dimension.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    /// Free-form status label owned by the UI (e.g. `todo`, `done`).
    pub status: String,
    pub score: f64,
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl Task {
    /// Creates a task with empty descriptive fields and no dates.
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }
}
