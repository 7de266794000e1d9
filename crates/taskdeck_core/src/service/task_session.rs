//! Task session: one UI session's view of the shared task list.
//!
//! # Responsibility
//! - Turn user intents into store mutations, local saves and broadcasts.
//! - Apply messages received from other sessions, then save and re-render.
//! - Drive the file channel (save/load and legacy export/import).
//!
//! # Invariants
//! - Mutate, then persist, then broadcast, then render.
//! - Persistence failures never roll back the in-memory change.
//! - Rejected intents leave the list unchanged and raise an error notice.
//! - Cancelled pickers raise no notice.

use crate::config::AppConfig;
use crate::model::id::{TaskId, UuidIdGenerator};
use crate::model::task::Task;
use crate::persist::error::PersistError;
use crate::persist::file_access::{
    select_file_access, ExportSettings, FileAccess, FileOutcome, FilePicker, HostCapabilities,
    TransferFileAccess,
};
use crate::persist::local_store::{KeyValueStore, LocalSnapshotStore, SqliteKeyValueStore};
use crate::service::ui::{Notice, UiSink};
use crate::store::task_store::{StatusFilter, StoreError, TaskCounts, TaskStore};
use crate::sync::channel::{BroadcastHub, SyncError};
use crate::sync::message::{SyncMessage, ToggledPayload};
use crate::sync::synchronizer::TabSynchronizer;
use log::{info, warn};
use mockable::Clock;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

pub type SessionResult<T> = Result<T, SessionError>;

/// Session-level error returned to intent callers.
#[derive(Debug)]
pub enum SessionError {
    Store(StoreError),
    Persist(PersistError),
    Sync(SyncError),
    /// No file channel was configured for this session.
    FileAccessUnavailable,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Persist(err) => write!(f, "{err}"),
            Self::Sync(err) => write!(f, "{err}"),
            Self::FileAccessUnavailable => write!(f, "file access is not configured"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Persist(err) => Some(err),
            Self::Sync(err) => Some(err),
            Self::FileAccessUnavailable => None,
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<PersistError> for SessionError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}

impl From<SyncError> for SessionError {
    fn from(value: SyncError) -> Self {
        Self::Sync(value)
    }
}

#[derive(Debug, Clone, Copy)]
enum FileSlot {
    Primary,
    Legacy,
}

impl FileSlot {
    fn label(self) -> &'static str {
        match self {
            Self::Primary => "file",
            Self::Legacy => "legacy",
        }
    }
}

/// One session (tab) over the shared task list.
pub struct TaskSession<K: KeyValueStore, U: UiSink> {
    store: TaskStore,
    local: LocalSnapshotStore<K>,
    sync: TabSynchronizer,
    files: Option<Box<dyn FileAccess>>,
    legacy_files: Option<Box<dyn FileAccess>>,
    ui: U,
}

impl<U: UiSink> TaskSession<SqliteKeyValueStore, U> {
    /// Opens a session wired from configuration.
    ///
    /// Uses the SQLite slot at `config.db_path`, UUID ids, and the file
    /// strategy matching `config.file_handles`.
    pub fn open_with_config<P>(
        config: &AppConfig,
        hub: &BroadcastHub,
        clock: Arc<dyn Clock + Send + Sync>,
        picker: Arc<P>,
        ui: U,
    ) -> SessionResult<Self>
    where
        P: FilePicker + 'static,
    {
        let kv = SqliteKeyValueStore::open(&config.db_path)?;
        let local = LocalSnapshotStore::new(kv, config.storage_key.clone());
        let sync = TabSynchronizer::join(hub, &config.channel_name)?;
        let store = TaskStore::new(Box::new(UuidIdGenerator), clock.clone());
        let settings = ExportSettings {
            download_dir: config.export_dir.clone(),
            file_prefix: config.export_prefix.clone(),
        };
        let capabilities = HostCapabilities {
            file_handles: config.file_handles,
        };
        let primary =
            select_file_access(capabilities, picker.clone(), settings.clone(), clock.clone());
        let legacy: Box<dyn FileAccess> =
            Box::new(TransferFileAccess::new(picker, settings, clock));

        Ok(Self::open(store, local, sync, ui).with_file_access(primary, legacy))
    }
}

impl<K: KeyValueStore, U: UiSink> TaskSession<K, U> {
    /// Builds a session and hydrates it from the local slot.
    ///
    /// A malformed or unreadable slot yields an empty list plus an error
    /// notice; it never fails the open.
    pub fn open(
        mut store: TaskStore,
        local: LocalSnapshotStore<K>,
        sync: TabSynchronizer,
        ui: U,
    ) -> Self {
        let outcome = local.load();
        if let Err(err) = store.replace_all(outcome.tasks) {
            warn!("event=session_open module=service status=error error={err}");
        }
        let mut session = Self {
            store,
            local,
            sync,
            files: None,
            legacy_files: None,
            ui,
        };
        if let Some(err) = outcome.error {
            session
                .ui
                .notify(Notice::error(format!("Could not load saved tasks: {err}")));
        }
        info!(
            "event=session_open module=service status=ok count={} topic={}",
            session.store.len(),
            session.sync.topic()
        );
        session.render();
        session
    }

    /// Attaches the file channel: `primary` for save/load, `legacy` for
    /// export/import.
    pub fn with_file_access(
        mut self,
        primary: Box<dyn FileAccess>,
        legacy: Box<dyn FileAccess>,
    ) -> Self {
        self.files = Some(primary);
        self.legacy_files = Some(legacy);
        self
    }

    /// Creates a task from user input.
    pub fn add(
        &mut self,
        title: &str,
        description: &str,
        time: Option<&str>,
    ) -> SessionResult<Task> {
        let task = match self.store.add(title, description, time) {
            Ok(task) => task,
            Err(err) => return Err(self.reject("add", err)),
        };
        if self.commit(SyncMessage::TaskAdded(task.clone())) {
            self.ui.notify(Notice::success("Task added."));
        }
        Ok(task)
    }

    /// Edits title/description/time of a task.
    pub fn update(
        &mut self,
        id: &TaskId,
        title: &str,
        description: &str,
        time: Option<&str>,
    ) -> SessionResult<Task> {
        let task = match self.store.update(id, title, description, time) {
            Ok(task) => task,
            Err(err) => return Err(self.reject("update", err)),
        };
        if self.commit(SyncMessage::TaskUpdated(task.clone())) {
            self.ui.notify(Notice::success("Task updated."));
        }
        Ok(task)
    }

    /// Flips completion state of a task.
    pub fn toggle(&mut self, id: &TaskId) -> SessionResult<Task> {
        let task = match self.store.toggle(id) {
            Ok(task) => task,
            Err(err) => return Err(self.reject("toggle", err)),
        };
        self.commit(SyncMessage::TaskToggled(ToggledPayload {
            id: task.id.clone(),
            completed: task.completed,
        }));
        Ok(task)
    }

    /// Deletes a task.
    pub fn remove(&mut self, id: &TaskId) -> SessionResult<Task> {
        let task = match self.store.remove(id) {
            Ok(task) => task,
            Err(err) => return Err(self.reject("remove", err)),
        };
        if self.commit(SyncMessage::TaskDeleted(task.id.clone())) {
            self.ui.notify(Notice::success("Task deleted."));
        }
        Ok(task)
    }

    /// Replaces the whole list and broadcasts it.
    pub fn replace_all(&mut self, tasks: Vec<Task>) -> SessionResult<()> {
        if let Err(err) = self.store.replace_all(tasks) {
            return Err(self.reject("replace_all", err));
        }
        self.commit(SyncMessage::TasksUpdated(self.store.tasks().to_vec()));
        Ok(())
    }

    /// Replaces the whole list from an untyped payload.
    pub fn replace_all_json(&mut self, value: serde_json::Value) -> SessionResult<()> {
        if let Err(err) = self.store.replace_all_json(value) {
            return Err(self.reject("replace_all", err));
        }
        self.commit(SyncMessage::TasksUpdated(self.store.tasks().to_vec()));
        Ok(())
    }

    /// Filtered, searched view sorted newest first.
    pub fn list(&self, filter: StatusFilter, query: &str) -> Vec<Task> {
        self.store.list(filter, query)
    }

    pub fn counts(&self) -> TaskCounts {
        self.store.counts()
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn local(&self) -> &LocalSnapshotStore<K> {
        &self.local
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    /// Applies every message received from other sessions, in order.
    ///
    /// Returns how many messages changed the list; a non-zero count raises
    /// one info notice.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        for message in self.sync.pending() {
            let outcome = self.sync.apply(&mut self.store, &message);
            if outcome.needs_persist() {
                self.persist_local();
            }
            if outcome.changed() {
                applied += 1;
                self.render();
            }
        }
        if applied > 0 {
            self.ui.notify(Notice::info(format!(
                "Synced {applied} change(s) from another window."
            )));
        }
        applied
    }

    /// Saves the list through the primary file strategy.
    pub fn save_to_file(&mut self) -> SessionResult<FileOutcome<PathBuf>> {
        self.save_file(FileSlot::Primary)
    }

    /// Saves through the primary file strategy to a freshly picked target.
    ///
    /// The handle strategy forgets its remembered file first, so the picker
    /// is always consulted and its answer becomes the new handle.
    pub fn save_to_file_as(&mut self) -> SessionResult<FileOutcome<PathBuf>> {
        if let Some(access) = self.files.as_mut() {
            access.forget_target();
        }
        self.save_file(FileSlot::Primary)
    }

    /// Loads a list through the primary file strategy.
    ///
    /// Returns the number of tasks loaded.
    pub fn load_from_file(&mut self) -> SessionResult<FileOutcome<usize>> {
        self.load_file(FileSlot::Primary)
    }

    /// Downloads a dated snapshot file.
    pub fn export_tasks(&mut self) -> SessionResult<FileOutcome<PathBuf>> {
        self.save_file(FileSlot::Legacy)
    }

    /// Imports a user-selected snapshot file.
    pub fn import_tasks(&mut self) -> SessionResult<FileOutcome<usize>> {
        self.load_file(FileSlot::Legacy)
    }

    fn save_file(&mut self, slot: FileSlot) -> SessionResult<FileOutcome<PathBuf>> {
        let access = match slot {
            FileSlot::Primary => self.files.as_mut(),
            FileSlot::Legacy => self.legacy_files.as_mut(),
        }
        .ok_or(SessionError::FileAccessUnavailable)?;
        let result = access.save_snapshot(self.store.tasks());

        match result {
            Ok(FileOutcome::Completed(path)) => {
                info!(
                    "event=file_export module=service status=ok channel={} count={}",
                    slot.label(),
                    self.store.len()
                );
                self.ui.notify(Notice::success(format!(
                    "Saved {} task(s) to {}.",
                    self.store.len(),
                    path.display()
                )));
                Ok(FileOutcome::Completed(path))
            }
            Ok(FileOutcome::Cancelled) => {
                info!(
                    "event=file_export module=service status=cancelled channel={}",
                    slot.label()
                );
                Ok(FileOutcome::Cancelled)
            }
            Err(err) => {
                warn!(
                    "event=file_export module=service status=error channel={} error={}",
                    slot.label(),
                    err
                );
                self.ui
                    .notify(Notice::error(format!("Could not save tasks to file: {err}")));
                Err(err.into())
            }
        }
    }

    fn load_file(&mut self, slot: FileSlot) -> SessionResult<FileOutcome<usize>> {
        let access = match slot {
            FileSlot::Primary => self.files.as_mut(),
            FileSlot::Legacy => self.legacy_files.as_mut(),
        }
        .ok_or(SessionError::FileAccessUnavailable)?;
        let result = access.load_snapshot();

        let tasks = match result {
            Ok(FileOutcome::Completed(tasks)) => tasks,
            Ok(FileOutcome::Cancelled) => {
                info!(
                    "event=file_import module=service status=cancelled channel={}",
                    slot.label()
                );
                return Ok(FileOutcome::Cancelled);
            }
            Err(err) => {
                warn!(
                    "event=file_import module=service status=error channel={} error={}",
                    slot.label(),
                    err
                );
                self.ui
                    .notify(Notice::error(format!("Could not load tasks from file: {err}")));
                return Err(err.into());
            }
        };

        let count = tasks.len();
        if let Err(err) = self.store.replace_all(tasks) {
            return Err(self.reject("import", err));
        }
        self.commit(SyncMessage::TasksUpdated(self.store.tasks().to_vec()));
        info!(
            "event=file_import module=service status=ok channel={} count={}",
            slot.label(),
            count
        );
        self.ui
            .notify(Notice::success(format!("Loaded {count} task(s).")));
        Ok(FileOutcome::Completed(count))
    }

    /// Persist, broadcast, render: the tail of every local mutation.
    ///
    /// Returns whether the local save succeeded.
    fn commit(&mut self, message: SyncMessage) -> bool {
        let saved = self.persist_local();
        self.sync.publish(&message);
        self.render();
        saved
    }

    fn persist_local(&mut self) -> bool {
        match self.local.save(self.store.tasks()) {
            Ok(()) => true,
            Err(err) => {
                self.ui
                    .notify(Notice::error(format!("Could not save tasks: {err}")));
                false
            }
        }
    }

    fn reject(&mut self, operation: &str, err: StoreError) -> SessionError {
        warn!("event=intent_rejected module=service status=error op={operation} error={err}");
        self.ui.notify(Notice::error(err.to_string()));
        SessionError::Store(err)
    }

    fn render(&mut self) {
        let view = self.store.list(StatusFilter::All, "");
        self.ui.render(&view);
    }
}

