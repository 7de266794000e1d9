//! Task store contracts and implementation.
//!
//! # Responsibility
//! - Provide add/update/toggle/remove/replace-all entry points.
//! - Produce filtered, searched and sorted views for rendering.
//!
//! # Invariants
//! - Ids are unique within the list at all times.
//! - `created_at` is never rewritten; `updated_at` changes only on edit.
//! - `list` is pure: display order is recomputed on every call.

use crate::model::id::{IdGenerator, TaskId};
use crate::model::task::{Task, TaskValidationError};
use crate::model::timestamp::now_millis;
use mockable::Clock;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type StoreResult<T> = Result<T, StoreError>;

/// Task store error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Input failed validation; nothing was mutated.
    Validation(TaskValidationError),
    /// No task carries the requested id.
    NotFound(TaskId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<TaskValidationError> for StoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Completion-state filter used by list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    /// Parses `all|completed|pending` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Some(Self::All),
            "completed" => Some(Self::Completed),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Pending => "pending",
        }
    }

    fn accepts(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Pending => !task.completed,
        }
    }
}

/// Summary counters for status displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskCounts {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

/// Owned in-memory task list with injected id source and clock.
pub struct TaskStore {
    tasks: Vec<Task>,
    ids: Box<dyn IdGenerator>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl TaskStore {
    /// Creates an empty store.
    pub fn new(ids: Box<dyn IdGenerator>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            tasks: Vec::new(),
            ids,
            clock,
        }
    }

    /// Creates a new pending task and appends it.
    ///
    /// # Errors
    /// - `Validation` when title or description is blank.
    pub fn add(&mut self, title: &str, description: &str, time: Option<&str>) -> StoreResult<Task> {
        let id = self.fresh_id();
        let task = Task::new(id, title, description, time, now_millis(self.clock.as_ref()))?;
        self.tasks.push(task.clone());
        Ok(task)
    }

    /// Replaces title/description/time of an existing task and stamps `updated_at`.
    ///
    /// # Errors
    /// - `Validation` when title or description is blank (checked first).
    /// - `NotFound` when `id` is unknown.
    pub fn update(
        &mut self,
        id: &TaskId,
        title: &str,
        description: &str,
        time: Option<&str>,
    ) -> StoreResult<Task> {
        crate::model::task::validate_text_fields(title, description)?;
        let edited_at = now_millis(self.clock.as_ref());
        let task = self.find_mut(id)?;
        task.apply_edit(title, description, time, edited_at)?;
        Ok(task.clone())
    }

    /// Flips `completed` on an existing task.
    pub fn toggle(&mut self, id: &TaskId) -> StoreResult<Task> {
        let task = self.find_mut(id)?;
        task.toggle();
        Ok(task.clone())
    }

    /// Removes a task and returns it.
    ///
    /// Direct removal of an unknown id reports `NotFound`; synced removals go
    /// through the reducer, which ignores unknown ids.
    pub fn remove(&mut self, id: &TaskId) -> StoreResult<Task> {
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(self.tasks.remove(index))
    }

    /// Replaces the whole list after validating every record.
    ///
    /// # Errors
    /// - `Validation` when a record is malformed or two records share an id.
    ///   The current list is left unchanged.
    pub fn replace_all(&mut self, tasks: Vec<Task>) -> StoreResult<()> {
        validate_list(&tasks)?;
        self.tasks = tasks;
        Ok(())
    }

    /// Replaces the whole list from an untyped payload.
    ///
    /// # Errors
    /// - `Validation(MalformedList)` when `value` is not an array of tasks.
    pub fn replace_all_json(&mut self, value: serde_json::Value) -> StoreResult<()> {
        if !value.is_array() {
            return Err(TaskValidationError::MalformedList(format!(
                "expected an array, got {}",
                json_kind(&value)
            ))
            .into());
        }
        let tasks = serde_json::from_value::<Vec<Task>>(value)
            .map_err(|err| TaskValidationError::MalformedList(err.to_string()))?;
        self.replace_all(tasks)
    }

    /// Returns filtered, searched tasks sorted by `created_at` descending.
    ///
    /// `query` is trimmed before the case-insensitive substring match, so a
    /// blank or whitespace-only query matches every task.
    pub fn list(&self, filter: StatusFilter, query: &str) -> Vec<Task> {
        let needle = query.trim().to_lowercase();
        let mut items = self
            .tasks
            .iter()
            .filter(|task| filter.accepts(task))
            .filter(|task| task.matches_query(&needle))
            .cloned()
            .collect::<Vec<_>>();
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        items
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    /// Returns the raw list in storage order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Mutable access for synchronized reducers.
    pub(crate) fn tasks_mut(&mut self) -> &mut Vec<Task> {
        &mut self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn counts(&self) -> TaskCounts {
        let completed = self.tasks.iter().filter(|task| task.completed).count();
        TaskCounts {
            total: self.tasks.len(),
            completed,
            pending: self.tasks.len() - completed,
        }
    }

    fn fresh_id(&mut self) -> TaskId {
        loop {
            let candidate = self.ids.next_id();
            if self.position(&candidate).is_none() {
                return candidate;
            }
        }
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| &task.id == id)
    }

    fn find_mut(&mut self, id: &TaskId) -> StoreResult<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|task| &task.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

/// Validates every record and checks id uniqueness.
pub fn validate_list(tasks: &[Task]) -> Result<(), TaskValidationError> {
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        task.validate()?;
        if !seen.insert(&task.id) {
            return Err(TaskValidationError::DuplicateId(task.id.clone()));
        }
    }
    Ok(())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{StatusFilter, StoreError, TaskStore};
    use crate::model::id::{SequentialIdGenerator, TaskId};
    use crate::model::task::TaskValidationError;
    use mockable::DefaultClock;
    use std::sync::Arc;

    fn store() -> TaskStore {
        TaskStore::new(
            Box::new(SequentialIdGenerator::starting_at(1)),
            Arc::new(DefaultClock),
        )
    }

    #[test]
    fn status_filter_parses_known_values() {
        assert_eq!(StatusFilter::parse("Completed"), Some(StatusFilter::Completed));
        assert_eq!(StatusFilter::parse(" pending "), Some(StatusFilter::Pending));
        assert_eq!(StatusFilter::parse(""), Some(StatusFilter::All));
        assert_eq!(StatusFilter::parse("done"), None);
    }

    #[test]
    fn add_skips_ids_already_in_list() {
        let mut store = store();
        store
            .replace_all_json(serde_json::json!([
                {"id": 1, "title": "t", "description": "d", "completed": false}
            ]))
            .unwrap();
        let added = store.add("a", "b", None).unwrap();
        assert_eq!(added.id, TaskId::Number(2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn update_validates_before_lookup() {
        let mut store = store();
        let err = store
            .update(&TaskId::Number(99), "", "d", None)
            .unwrap_err();
        assert_eq!(err, StoreError::Validation(TaskValidationError::EmptyTitle));
    }

    #[test]
    fn replace_all_rejects_duplicate_ids_and_keeps_list() {
        let mut store = store();
        store.add("keep", "me", None).unwrap();
        let err = store
            .replace_all_json(serde_json::json!([
                {"id": 5, "title": "a", "description": "b", "completed": false},
                {"id": 5, "title": "c", "description": "d", "completed": true}
            ]))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Validation(TaskValidationError::DuplicateId(TaskId::Number(5)))
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.tasks()[0].title, "keep");
    }

    #[test]
    fn counts_split_completed_and_pending() {
        let mut store = store();
        let first = store.add("a", "b", None).unwrap();
        store.add("c", "d", None).unwrap();
        store.toggle(&first.id).unwrap();
        let counts = store.counts();
        assert_eq!((counts.total, counts.completed, counts.pending), (2, 1, 1));
    }
}
