//! Dimension display config and per-year dimension content.
//!
//! # Responsibility
//! - Hold one dimension's goals and tasks for one year.
//! - Keep positional quarter/month semantics explicit in the type.
//!
//! # Invariants
//! - `quarterly_goals` always has `QUARTER_COUNT` slots; empty slot == `""`.
//! - `monthly_tasks` always has `MONTH_COUNT` slots; empty slot == `[]`.
//! - Settings payloads round-trip unknown fields untouched.

use crate::model::task::Task;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Number of quarter slots per dimension.
pub const QUARTER_COUNT: usize = 4;
/// Number of month slots per dimension.
pub const MONTH_COUNT: usize = 12;

/// Goal text per quarter, index 0..=3.
pub type QuarterlyGoals = [String; QUARTER_COUNT];
/// Task list per month, index 0..=11.
pub type MonthlyTasks = [Vec<Task>; MONTH_COUNT];

/// Display metadata for a dimension within one year.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DimensionConfig {
    /// Unique within a year; joins to `AnnualData::dimensions`.
    pub key: String,
    pub title: String,
    pub icon: String,
    pub color: String,
    pub is_default: bool,
}

/// Score weights applied by the UI when computing progress.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringSettings {
    pub completed_score: f64,
    pub in_progress_score: f64,
    pub not_started_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_weights: Option<BTreeMap<String, f64>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Free-form per-dimension settings stored as JSON text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DimensionSettings {
    pub scoring: ScoringSettings,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One dimension's content for one year.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DimensionData {
    pub annual_goal: String,
    pub quarterly_goals: QuarterlyGoals,
    #[serde(deserialize_with = "deserialize_month_slots")]
    pub monthly_tasks: MonthlyTasks,
    pub total_score: f64,
    pub completed_tasks: i64,
    pub total_tasks: i64,
    /// Integer percentage.
    pub progress: i64,
    pub settings: DimensionSettings,
}

impl DimensionData {
    /// Iterates every task paired with its month index, in month order.
    pub fn tasks(&self) -> impl Iterator<Item = (usize, &Task)> + '_ {
        self.monthly_tasks
            .iter()
            .enumerate()
            .flat_map(|(month, tasks)| tasks.iter().map(move |task| (month, task)))
    }

    /// Total number of month associations across all slots.
    pub fn task_count(&self) -> usize {
        self.monthly_tasks.iter().map(Vec::len).sum()
    }
}

// Older exports write `null` for a month without tasks.
fn deserialize_month_slots<'de, D>(deserializer: D) -> Result<MonthlyTasks, D::Error>
where
    D: Deserializer<'de>,
{
    let slots = <[Option<Vec<Task>>; MONTH_COUNT]>::deserialize(deserializer)?;
    Ok(slots.map(Option::unwrap_or_default))
}

#[cfg(test)]
mod tests {
    use super::{DimensionData, DimensionSettings, MONTH_COUNT, QUARTER_COUNT};
    use crate::model::task::Task;
    use serde_json::json;

    #[test]
    fn default_dimension_has_fixed_slots() {
        let data = DimensionData::default();
        assert_eq!(data.quarterly_goals.len(), QUARTER_COUNT);
        assert_eq!(data.monthly_tasks.len(), MONTH_COUNT);
        assert_eq!(data.task_count(), 0);
    }

    #[test]
    fn tasks_iterates_in_month_order() {
        let mut data = DimensionData::default();
        data.monthly_tasks[11].push(Task::new("late", "December"));
        data.monthly_tasks[0].push(Task::new("early", "January"));

        let order: Vec<(usize, &str)> = data
            .tasks()
            .map(|(month, task)| (month, task.id.as_str()))
            .collect();
        assert_eq!(order, vec![(0, "early"), (11, "late")]);
    }

    #[test]
    fn null_month_slots_deserialize_as_empty() {
        let value = json!({
            "annualGoal": "stay fit",
            "quarterlyGoals": ["a", "", "", ""],
            "monthlyTasks": [
                [{"id": "t1", "title": "Run", "status": "done"}],
                null, null, null, null, null, null, null, null, null, null, null
            ],
            "progress": 40
        });

        let data: DimensionData = serde_json::from_value(value).unwrap();
        assert_eq!(data.monthly_tasks[0][0].title, "Run");
        assert!(data.monthly_tasks[1].is_empty());
        assert_eq!(data.progress, 40);
    }

    #[test]
    fn wrong_month_slot_count_is_rejected() {
        let value = json!({ "monthlyTasks": [[], []] });
        assert!(serde_json::from_value::<DimensionData>(value).is_err());
    }

    #[test]
    fn settings_keep_unknown_fields() {
        let raw = json!({
            "scoring": { "completedScore": 10.0, "bonus": 2 },
            "theme": "dark"
        });

        let settings: DimensionSettings = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(settings.scoring.completed_score, 10.0);
        assert_eq!(settings.extra.get("theme"), Some(&json!("dark")));

        let back = serde_json::to_value(&settings).unwrap();
        assert_eq!(back["theme"], json!("dark"));
        assert_eq!(back["scoring"]["bonus"], json!(2));
    }
}
