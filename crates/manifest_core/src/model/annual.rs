//! Year-level aggregate and the whole-store export root.
//!
//! # Invariants
//! - `year` is the unique key of an `AnnualData`.
//! - Every key in `dimensions` is expected to have a `DimensionConfig` in
//!   `dimension_configs`; the store does not enforce this.

use crate::model::dimension::{DimensionConfig, DimensionData, ScoringSettings};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Whole-store snapshot keyed by year, used for import/export.
pub type SystemData = BTreeMap<String, AnnualData>;

/// Free-form year settings stored as JSON text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnualSettings {
    pub scoring: ScoringSettings,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Everything planned for one year.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnualData {
    /// Year key, e.g. `"2024"`.
    pub year: String,
    pub total_score: f64,
    pub settings: AnnualSettings,
    /// Display order of dimensions.
    pub dimension_configs: Vec<DimensionConfig>,
    pub dimensions: BTreeMap<String, DimensionData>,
}

impl AnnualData {
    /// Creates an empty year.
    pub fn new(year: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            ..Self::default()
        }
    }

    /// Dimension keys used in `dimensions` that have no config entry.
    pub fn unconfigured_dimensions(&self) -> Vec<&str> {
        self.dimensions
            .keys()
            .filter(|key| !self.dimension_configs.iter().any(|config| &config.key == *key))
            .map(String::as_str)
            .collect()
    }
}
