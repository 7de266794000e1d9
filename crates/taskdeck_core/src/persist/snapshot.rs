//! Snapshot codec shared by every persistence channel.
//!
//! Format: a JSON array of task objects. Files get 2-space pretty printing,
//! the local slot gets the compact form.

use crate::model::task::Task;
use crate::persist::error::{PersistError, PersistResult};
use crate::store::task_store::validate_list;
use serde_json::Value;

/// Serializes the list in compact form for the local slot.
pub fn encode_compact(tasks: &[Task]) -> PersistResult<String> {
    serde_json::to_string(tasks).map_err(|err| PersistError::Format(err.to_string()))
}

/// Serializes the list with 2-space indentation for files.
pub fn encode_pretty(tasks: &[Task]) -> PersistResult<String> {
    serde_json::to_string_pretty(tasks).map_err(|err| PersistError::Format(err.to_string()))
}

/// Parses snapshot text into a validated task list.
///
/// # Errors
/// - `Format` when text is not JSON, not an array, holds a malformed task,
///   or repeats an id.
pub fn decode(text: &str) -> PersistResult<Vec<Task>> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| PersistError::Format(err.to_string()))?;
    if !value.is_array() {
        return Err(PersistError::Format(
            "expected a JSON array of tasks".to_string(),
        ));
    }
    let tasks = serde_json::from_value::<Vec<Task>>(value)
        .map_err(|err| PersistError::Format(err.to_string()))?;
    validate_list(&tasks).map_err(|err| PersistError::Format(err.to_string()))?;
    Ok(tasks)
}
