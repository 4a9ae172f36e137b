//! Task list domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single to-do item owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
}

/// One page of a user's tasks.
#[derive(Debug, Clone)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub page: u32,
    pub limit: u32,
    /// Total number of tasks owned by the user.
    pub total: u64,
}

impl TaskPage {
    /// Number of pages at the current limit.
    pub fn pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }
}
