//! Local user profile.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A profile the user can switch between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub username: String,
    pub avatar_path: String,
}

impl Account {
    /// Creates an account with a freshly generated id.
    pub fn new(username: impl Into<String>, avatar_path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.into(),
            avatar_path: avatar_path.into(),
        }
    }
}
