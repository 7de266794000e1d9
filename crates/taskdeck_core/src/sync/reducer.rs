//! Pure reducers for received sync messages.
//!
//! Each arm mutates only the given list; persistence and rendering are
//! separate steps driven by the returned `ReduceOutcome`.

use crate::model::task::Task;
use crate::sync::message::{SyncMessage, ToggledPayload};

/// What a reducer did with one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOutcome {
    /// The list changed. `persist` says whether the receiver must save.
    Applied { persist: bool },
    /// Target id was unknown; nothing changed.
    Ignored,
}

impl ReduceOutcome {
    pub fn changed(self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn needs_persist(self) -> bool {
        matches!(self, Self::Applied { persist: true })
    }
}

/// Applies one received message to `tasks`.
pub fn reduce(tasks: &mut Vec<Task>, message: &SyncMessage) -> ReduceOutcome {
    match message {
        SyncMessage::TasksUpdated(snapshot) => {
            *tasks = snapshot.clone();
            ReduceOutcome::Applied { persist: false }
        }
        SyncMessage::TaskAdded(task) => {
            match tasks.iter_mut().find(|existing| existing.id == task.id) {
                Some(existing) => *existing = task.clone(),
                None => tasks.push(task.clone()),
            }
            ReduceOutcome::Applied { persist: true }
        }
        SyncMessage::TaskUpdated(task) => {
            match tasks.iter_mut().find(|existing| existing.id == task.id) {
                Some(existing) => {
                    *existing = task.clone();
                    ReduceOutcome::Applied { persist: true }
                }
                None => ReduceOutcome::Ignored,
            }
        }
        SyncMessage::TaskDeleted(id) => {
            let before = tasks.len();
            tasks.retain(|task| &task.id != id);
            if tasks.len() == before {
                ReduceOutcome::Ignored
            } else {
                ReduceOutcome::Applied { persist: true }
            }
        }
        SyncMessage::TaskToggled(ToggledPayload { id, completed }) => {
            match tasks.iter_mut().find(|task| &task.id == id) {
                Some(task) => {
                    task.completed = *completed;
                    ReduceOutcome::Applied { persist: true }
                }
                None => ReduceOutcome::Ignored,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{reduce, ReduceOutcome};
    use crate::model::id::TaskId;
    use crate::model::task::Task;
    use crate::model::timestamp::parse_iso8601;
    use crate::sync::message::{SyncMessage, ToggledPayload};

    fn task(id: u64, title: &str) -> Task {
        let created = parse_iso8601("2026-10-18T09:00:00.000Z").unwrap();
        Task::new(TaskId::Number(id), title, "details", None, created).unwrap()
    }

    #[test]
    fn tasks_updated_replaces_without_persist() {
        let mut tasks = vec![task(1, "old")];
        let outcome = reduce(&mut tasks, &SyncMessage::TasksUpdated(vec![task(2, "new")]));
        assert_eq!(outcome, ReduceOutcome::Applied { persist: false });
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, TaskId::Number(2));
    }

    #[test]
    fn task_added_with_known_id_overwrites_instead_of_duplicating() {
        let mut tasks = vec![task(1, "first")];
        let outcome = reduce(&mut tasks, &SyncMessage::TaskAdded(task(1, "second")));
        assert!(outcome.needs_persist());
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "second");
    }

    #[test]
    fn updates_for_unknown_ids_are_ignored() {
        let mut tasks = vec![task(1, "first")];
        let before = tasks.clone();
        assert_eq!(
            reduce(&mut tasks, &SyncMessage::TaskUpdated(task(9, "ghost"))),
            ReduceOutcome::Ignored
        );
        assert_eq!(
            reduce(&mut tasks, &SyncMessage::TaskDeleted(TaskId::Number(9))),
            ReduceOutcome::Ignored
        );
        assert_eq!(
            reduce(
                &mut tasks,
                &SyncMessage::TaskToggled(ToggledPayload {
                    id: TaskId::Number(9),
                    completed: true
                })
            ),
            ReduceOutcome::Ignored
        );
        assert_eq!(tasks, before);
    }

    #[test]
    fn toggled_sets_given_value_rather_than_flipping() {
        let mut tasks = vec![task(1, "first")];
        let message = SyncMessage::TaskToggled(ToggledPayload {
            id: TaskId::Number(1),
            completed: true,
        });
        reduce(&mut tasks, &message);
        reduce(&mut tasks, &message);
        assert!(tasks[0].completed);
    }

    #[test]
    fn deleted_removes_matching_task() {
        let mut tasks = vec![task(1, "a"), task(2, "b")];
        let outcome = reduce(&mut tasks, &SyncMessage::TaskDeleted(TaskId::Number(1)));
        assert!(outcome.changed());
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, TaskId::Number(2));
    }
}
