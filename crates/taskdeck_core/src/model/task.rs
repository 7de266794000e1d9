//! Task domain record.
//!
//! # Responsibility
//! - Define the canonical record written to snapshots and sync messages.
//! - Validate required fields before a task enters any list.
//!
//! # Invariants
//! - `title` and `description` are non-empty after trimming.
//! - `created_at` never changes after construction.
//! - Deserialization rejects records that fail `Task::validate()`.

use crate::model::id::TaskId;
use crate::model::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Canonical task record.
///
/// Field names serialize in camelCase to match the snapshot format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TaskRecord")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    /// Optional schedule reminder, kept verbatim as entered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub completed: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Set on every edit; toggles and deletes leave it alone.
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Domain validation failures for task records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyId,
    EmptyTitle,
    EmptyDescription,
    /// Two records in one list share an id.
    DuplicateId(TaskId),
    /// A replace-all payload is not a list of well-formed tasks.
    MalformedList(String),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "task id must not be empty"),
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::EmptyDescription => write!(f, "description must not be empty"),
            Self::DuplicateId(id) => write!(f, "duplicate task id: {id}"),
            Self::MalformedList(details) => write!(f, "malformed task list: {details}"),
        }
    }
}

impl Error for TaskValidationError {}

impl Task {
    /// Builds a fresh, pending task.
    ///
    /// # Errors
    /// - Returns `EmptyTitle`/`EmptyDescription` when trimmed input is empty.
    pub fn new(
        id: TaskId,
        title: &str,
        description: &str,
        time: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TaskValidationError> {
        let (title, description) = validate_text_fields(title, description)?;
        let task = Self {
            id,
            title,
            description,
            time: normalize_time(time),
            completed: false,
            created_at,
            updated_at: None,
        };
        task.validate()?;
        Ok(task)
    }

    /// Replaces editable fields and stamps `updated_at`.
    ///
    /// Validation runs before any field is touched.
    pub fn apply_edit(
        &mut self,
        title: &str,
        description: &str,
        time: Option<&str>,
        edited_at: DateTime<Utc>,
    ) -> Result<(), TaskValidationError> {
        let (title, description) = validate_text_fields(title, description)?;
        self.title = title;
        self.description = description;
        self.time = normalize_time(time);
        self.updated_at = Some(edited_at);
        Ok(())
    }

    /// Flips completion state.
    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }

    /// Returns whether title or description contains `needle_lower`.
    ///
    /// `needle_lower` must already be lowercased.
    pub fn matches_query(&self, needle_lower: &str) -> bool {
        needle_lower.is_empty()
            || self.title.to_lowercase().contains(needle_lower)
            || self.description.to_lowercase().contains(needle_lower)
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_empty() {
            return Err(TaskValidationError::EmptyId);
        }
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        if self.description.trim().is_empty() {
            return Err(TaskValidationError::EmptyDescription);
        }
        Ok(())
    }
}

/// Validates and trims user-entered text fields.
pub fn validate_text_fields(
    title: &str,
    description: &str,
) -> Result<(String, String), TaskValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    let description = description.trim();
    if description.is_empty() {
        return Err(TaskValidationError::EmptyDescription);
    }
    Ok((title.to_string(), description.to_string()))
}

fn normalize_time(time: Option<&str>) -> Option<String> {
    time.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Wire shape accepted on deserialization before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: TaskId,
    title: String,
    description: String,
    #[serde(default)]
    time: Option<String>,
    completed: bool,
    /// Records without a creation stamp sort last.
    #[serde(default = "epoch", with = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    updated_at: Option<DateTime<Utc>>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

impl TryFrom<TaskRecord> for Task {
    type Error = TaskValidationError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let task = Self {
            id: record.id,
            title: record.title,
            description: record.description,
            time: record.time,
            completed: record.completed,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        task.validate()?;
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskValidationError};
    use crate::model::id::TaskId;
    use crate::model::timestamp::parse_iso8601;

    fn created() -> chrono::DateTime<chrono::Utc> {
        parse_iso8601("2026-10-18T09:00:00.000Z").expect("valid timestamp")
    }

    #[test]
    fn new_trims_fields_and_drops_blank_time() {
        let task = Task::new(TaskId::Number(1), "  Buy milk ", " 2% ", Some("  "), created())
            .expect("valid task");
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "2%");
        assert_eq!(task.time, None);
        assert!(!task.completed);
        assert_eq!(task.updated_at, None);
    }

    #[test]
    fn new_rejects_blank_title_then_description() {
        let err = Task::new(TaskId::Number(1), " ", "", None, created()).unwrap_err();
        assert_eq!(err, TaskValidationError::EmptyTitle);
        let err = Task::new(TaskId::Number(1), "t", "\t", None, created()).unwrap_err();
        assert_eq!(err, TaskValidationError::EmptyDescription);
    }

    #[test]
    fn apply_edit_leaves_task_untouched_on_validation_error() {
        let mut task =
            Task::new(TaskId::Number(1), "a", "b", Some("2026-10-20T10:00"), created()).unwrap();
        let before = task.clone();
        let err = task.apply_edit("a", "  ", None, created()).unwrap_err();
        assert_eq!(err, TaskValidationError::EmptyDescription);
        assert_eq!(task, before);
    }

    #[test]
    fn serializes_camel_case_and_omits_absent_fields() {
        let task = Task::new(TaskId::Number(7), "a", "b", None, created()).unwrap();
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["createdAt"], "2026-10-18T09:00:00.000Z");
        assert_eq!(json["completed"], false);
        assert!(json.get("time").is_none());
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn deserialize_rejects_blank_title() {
        let value = serde_json::json!({
            "id": 1,
            "title": "   ",
            "description": "d",
            "completed": false,
            "createdAt": "2026-10-18T09:00:00.000Z"
        });
        let err = serde_json::from_value::<Task>(value).unwrap_err();
        assert!(err.to_string().contains("title must not be empty"), "{err}");
    }

    #[test]
    fn deserialize_accepts_minimal_record() {
        let value = serde_json::json!({
            "id": "legacy",
            "title": "t",
            "description": "d",
            "completed": true
        });
        let task = serde_json::from_value::<Task>(value).unwrap();
        assert!(task.completed);
        assert_eq!(task.created_at.timestamp(), 0);
    }
}
