//! Broadcast message taxonomy.
//!
//! Wire envelope: `{ "type": "<TAG>", "data": <payload> }`.

use crate::model::id::TaskId;
use crate::model::task::Task;
use serde::{Deserialize, Serialize};

/// One broadcast mutation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncMessage {
    /// Full list after a wholesale replace (import/load).
    TasksUpdated(Vec<Task>),
    TaskAdded(Task),
    TaskUpdated(Task),
    TaskDeleted(TaskId),
    TaskToggled(ToggledPayload),
}

/// Payload of `TASK_TOGGLED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggledPayload {
    pub id: TaskId,
    pub completed: bool,
}

impl SyncMessage {
    /// Wire tag of this message.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::TasksUpdated(_) => "TASKS_UPDATED",
            Self::TaskAdded(_) => "TASK_ADDED",
            Self::TaskUpdated(_) => "TASK_UPDATED",
            Self::TaskDeleted(_) => "TASK_DELETED",
            Self::TaskToggled(_) => "TASK_TOGGLED",
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}
