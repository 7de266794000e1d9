//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level task functions to Dart via FRB.
//! - Own one task session per UI window and hand its notices back in
//!   envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call names its session; sessions of one process share the
//!   broadcast hub and the SQLite slot, so windows converge via `sync_pump`.
//! - Every envelope carries the notices raised by that call, in order.
//! - Native file dialogs run on the Dart side; their result is passed in as
//!   an optional path (`None` means dismissed).

use log::{error, info};
use mockable::DefaultClock;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use taskdeck_core::model::timestamp::format_iso8601;
use taskdeck_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AppConfig, BroadcastHub, FileOutcome, Notice, PresetPicker, RecordingSink, SessionError,
    SqliteKeyValueStore, StatusFilter, Task, TaskId, TaskSession,
};

type FfiSession = TaskSession<SqliteKeyValueStore, RecordingSink>;

/// One UI window: its session plus the picker its dialogs stage into.
struct Window {
    session: FfiSession,
    picker: Arc<PresetPicker>,
}

#[derive(Default)]
struct WindowRegistry {
    next_id: u64,
    windows: HashMap<u64, Window>,
}

static WINDOWS: Lazy<Mutex<WindowRegistry>> = Lazy::new(|| Mutex::new(WindowRegistry::default()));

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive); empty
///   uses the configured level (`TASKDECK_LOG_LEVEL`, else the build default).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let level = match effective_log_level(&level) {
        Ok(level) => level,
        Err(err) => return err,
    };
    match init_logging_inner(&level, log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Task projection handed to Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    /// Task ID in string form (numeric legacy ids are rendered as digits).
    pub id: String,
    pub title: String,
    pub description: String,
    /// Free-form scheduled time (`YYYY-MM-DDTHH:MM`), if any.
    pub time: Option<String>,
    pub completed: bool,
    /// ISO 8601 with milliseconds and `Z`.
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Transient notification raised during a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeItem {
    /// `success|info|error`.
    pub level: String,
    pub message: String,
}

/// Response envelope for opening a window session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOpenResponse {
    pub ok: bool,
    /// Handle passed to every other call from this window.
    pub session_id: Option<u64>,
    /// Tasks loaded from the local slot, newest first.
    pub items: Vec<TaskItem>,
    pub message: String,
    /// Includes an error notice when the saved slot was unreadable.
    pub notices: Vec<NoticeItem>,
}

/// Response envelope for single-task intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    pub ok: bool,
    /// Resulting task on success (the removed task for `task_remove`).
    pub task: Option<TaskItem>,
    pub message: String,
    pub notices: Vec<NoticeItem>,
}

/// Response envelope for list reads and whole-list changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub ok: bool,
    /// Tasks sorted newest first.
    pub items: Vec<TaskItem>,
    pub message: String,
    pub notices: Vec<NoticeItem>,
}

/// Status counters for header badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskCountsResponse {
    pub ok: bool,
    pub total: u32,
    pub completed: u32,
    pub pending: u32,
}

/// Response envelope for file channel calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileActionResponse {
    pub ok: bool,
    /// The user dismissed the dialog; no notice is raised.
    pub cancelled: bool,
    /// File written by a save/export.
    pub path: Option<String>,
    /// Number of tasks loaded by a load/import.
    pub count: Option<u32>,
    pub message: String,
    pub notices: Vec<NoticeItem>,
}

/// Response envelope for applying messages from other windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPumpResponse {
    pub ok: bool,
    /// Messages that changed the list.
    pub applied: u32,
    /// Full list after applying, newest first.
    pub items: Vec<TaskItem>,
    pub message: String,
    pub notices: Vec<NoticeItem>,
}

/// Opens a task session for one UI window.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - The returned `session_id` stays valid until `session_close`.
#[flutter_rust_bridge::frb(sync)]
pub fn session_open() -> SessionOpenResponse {
    let failure = |message: String| SessionOpenResponse {
        ok: false,
        session_id: None,
        items: Vec::new(),
        message,
        notices: Vec::new(),
    };
    let mut window = match open_window() {
        Ok(window) => window,
        Err(err) => return failure(format!("session_open failed: {err}")),
    };
    let items = to_items(&window.session.list(StatusFilter::All, ""));
    let notices = drain_notices(&mut window.session);

    let mut registry = match WINDOWS.lock() {
        Ok(registry) => registry,
        Err(_) => return failure("session_open failed: session registry poisoned".to_string()),
    };
    registry.next_id += 1;
    let session_id = registry.next_id;
    registry.windows.insert(session_id, window);
    info!(
        "event=ffi_session_open module=ffi status=ok session={session_id} open={}",
        registry.windows.len()
    );

    SessionOpenResponse {
        ok: true,
        session_id: Some(session_id),
        message: list_message(items.len()),
        items,
        notices,
    }
}

/// Closes a window session; returns whether it was open.
///
/// The session leaves the broadcast topic immediately.
#[flutter_rust_bridge::frb(sync)]
pub fn session_close(session_id: u64) -> bool {
    let Ok(mut registry) = WINDOWS.lock() else {
        return false;
    };
    let closed = registry.windows.remove(&session_id).is_some();
    info!(
        "event=ffi_session_close module=ffi status={} session={session_id}",
        if closed { "ok" } else { "unknown" }
    );
    closed
}

/// Creates a task.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Blank title/description returns `ok=false` and leaves the list unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(
    session_id: u64,
    title: String,
    description: String,
    time: Option<String>,
) -> TaskActionResponse {
    task_action(session_id, "task_add", "Task added.", |session| {
        session.add(&title, &description, time.as_deref())
    })
}

/// Replaces title, description and time of a task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_update(
    session_id: u64,
    id: String,
    title: String,
    description: String,
    time: Option<String>,
) -> TaskActionResponse {
    let id = TaskId::parse(id.trim());
    task_action(session_id, "task_update", "Task updated.", |session| {
        session.update(&id, &title, &description, time.as_deref())
    })
}

/// Flips completion state of a task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(session_id: u64, id: String) -> TaskActionResponse {
    let id = TaskId::parse(id.trim());
    task_action(session_id, "task_toggle", "Task toggled.", |session| {
        session.toggle(&id)
    })
}

/// Deletes a task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_remove(session_id: u64, id: String) -> TaskActionResponse {
    let id = TaskId::parse(id.trim());
    task_action(session_id, "task_remove", "Task deleted.", |session| {
        session.remove(&id)
    })
}

/// Lists tasks by status and search text.
///
/// Input semantics:
/// - `filter`: `all|completed|pending`; empty means `all`.
/// - `query`: trimmed, case-insensitive substring of title or description.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list(session_id: u64, filter: String, query: String) -> TaskListResponse {
    let Some(filter) = StatusFilter::parse(&filter) else {
        return TaskListResponse::failure(
            format!("task_list failed: unsupported filter `{}`", filter.trim()),
            Vec::new(),
        );
    };
    match with_window(session_id, |window| {
        let items = to_items(&window.session.list(filter, &query));
        (items, drain_notices(&mut window.session))
    }) {
        Ok((items, notices)) => TaskListResponse {
            ok: true,
            message: list_message(items.len()),
            items,
            notices,
        },
        Err(err) => TaskListResponse::failure(format!("task_list failed: {err}"), Vec::new()),
    }
}

/// Replaces the whole list from a JSON array payload.
///
/// A non-array or invalid payload returns `ok=false` and keeps the list.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_replace_all(session_id: u64, json: String) -> TaskListResponse {
    let value = match serde_json::from_str::<serde_json::Value>(&json) {
        Ok(value) => value,
        Err(err) => {
            return TaskListResponse::failure(
                format!("tasks_replace_all failed: invalid JSON: {err}"),
                Vec::new(),
            )
        }
    };
    match with_window(session_id, |window| {
        let result = window.session.replace_all_json(value);
        let items = to_items(&window.session.list(StatusFilter::All, ""));
        (result, items, drain_notices(&mut window.session))
    }) {
        Ok((Ok(()), items, notices)) => TaskListResponse {
            ok: true,
            message: list_message(items.len()),
            items,
            notices,
        },
        Ok((Err(err), _, notices)) => {
            TaskListResponse::failure(format!("tasks_replace_all failed: {err}"), notices)
        }
        Err(err) => {
            TaskListResponse::failure(format!("tasks_replace_all failed: {err}"), Vec::new())
        }
    }
}

/// Returns total/completed/pending counters.
#[flutter_rust_bridge::frb(sync)]
pub fn task_counts(session_id: u64) -> TaskCountsResponse {
    match with_window(session_id, |window| window.session.counts()) {
        Ok(counts) => TaskCountsResponse {
            ok: true,
            total: to_u32(counts.total),
            completed: to_u32(counts.completed),
            pending: to_u32(counts.pending),
        },
        Err(_) => TaskCountsResponse::default(),
    }
}

/// Saves the list to a file.
///
/// Input semantics:
/// - `path: Some(..)`: target chosen in the save dialog; it becomes the
///   remembered file even when another one was remembered before.
/// - `path: None`: overwrite the remembered file; cancelled when there is none.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_save_to_file(session_id: u64, path: Option<String>) -> FileActionResponse {
    file_save(session_id, "tasks_save_to_file", |window| match path {
        Some(path) => {
            window.picker.stage_save(Some(PathBuf::from(path)));
            window.session.save_to_file_as()
        }
        None => window.session.save_to_file(),
    })
}

/// Loads the list from a file chosen in the open dialog.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_load_from_file(session_id: u64, path: Option<String>) -> FileActionResponse {
    file_load(session_id, "tasks_load_from_file", |window| {
        window.picker.stage_open(path.map(PathBuf::from));
        window.session.load_from_file()
    })
}

/// Writes a dated snapshot into the configured download directory.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_export(session_id: u64) -> FileActionResponse {
    file_save(session_id, "tasks_export", |window| {
        window.session.export_tasks()
    })
}

/// Imports a snapshot file chosen in the upload dialog.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_import(session_id: u64, path: Option<String>) -> FileActionResponse {
    file_load(session_id, "tasks_import", |window| {
        window.picker.stage_open(path.map(PathBuf::from));
        window.session.import_tasks()
    })
}

/// Applies changes made by other windows of this process.
///
/// Hosts call this on a timer or before re-rendering.
#[flutter_rust_bridge::frb(sync)]
pub fn sync_pump(session_id: u64) -> SyncPumpResponse {
    match with_window(session_id, |window| {
        let applied = window.session.pump();
        let items = to_items(&window.session.list(StatusFilter::All, ""));
        (applied, items, drain_notices(&mut window.session))
    }) {
        Ok((applied, items, notices)) => SyncPumpResponse {
            ok: true,
            applied: to_u32(applied),
            message: format!("Applied {applied} change(s)."),
            items,
            notices,
        },
        Err(err) => SyncPumpResponse {
            ok: false,
            applied: 0,
            items: Vec::new(),
            message: format!("sync_pump failed: {err}"),
            notices: Vec::new(),
        },
    }
}

impl TaskActionResponse {
    fn failure(message: String, notices: Vec<NoticeItem>) -> Self {
        Self {
            ok: false,
            task: None,
            message,
            notices,
        }
    }
}

impl TaskListResponse {
    fn failure(message: String, notices: Vec<NoticeItem>) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            message,
            notices,
        }
    }
}

impl FileActionResponse {
    fn failure(message: String, notices: Vec<NoticeItem>) -> Self {
        Self {
            ok: false,
            cancelled: false,
            path: None,
            count: None,
            message,
            notices,
        }
    }

    fn cancelled(notices: Vec<NoticeItem>) -> Self {
        Self {
            ok: true,
            cancelled: true,
            path: None,
            count: None,
            message: "Cancelled.".to_string(),
            notices,
        }
    }
}

fn task_action(
    session_id: u64,
    operation: &str,
    success_message: &str,
    f: impl FnOnce(&mut FfiSession) -> Result<Task, SessionError>,
) -> TaskActionResponse {
    match with_window(session_id, |window| {
        let result = f(&mut window.session);
        (result, drain_notices(&mut window.session))
    }) {
        Ok((Ok(task), notices)) => TaskActionResponse {
            ok: true,
            task: Some(to_item(&task)),
            message: success_message.to_string(),
            notices,
        },
        Ok((Err(err), notices)) => {
            TaskActionResponse::failure(format!("{operation} failed: {err}"), notices)
        }
        Err(err) => TaskActionResponse::failure(format!("{operation} failed: {err}"), Vec::new()),
    }
}

fn file_save(
    session_id: u64,
    operation: &str,
    f: impl FnOnce(&mut Window) -> Result<FileOutcome<PathBuf>, SessionError>,
) -> FileActionResponse {
    match with_window(session_id, |window| {
        let result = f(window);
        (result, drain_notices(&mut window.session))
    }) {
        Ok((Ok(FileOutcome::Completed(path)), notices)) => FileActionResponse {
            ok: true,
            cancelled: false,
            path: Some(path.display().to_string()),
            count: None,
            message: "Saved.".to_string(),
            notices,
        },
        Ok((Ok(FileOutcome::Cancelled), notices)) => FileActionResponse::cancelled(notices),
        Ok((Err(err), notices)) => {
            FileActionResponse::failure(format!("{operation} failed: {err}"), notices)
        }
        Err(err) => FileActionResponse::failure(format!("{operation} failed: {err}"), Vec::new()),
    }
}

fn file_load(
    session_id: u64,
    operation: &str,
    f: impl FnOnce(&mut Window) -> Result<FileOutcome<usize>, SessionError>,
) -> FileActionResponse {
    match with_window(session_id, |window| {
        let result = f(window);
        (result, drain_notices(&mut window.session))
    }) {
        Ok((Ok(FileOutcome::Completed(count)), notices)) => FileActionResponse {
            ok: true,
            cancelled: false,
            path: None,
            count: Some(to_u32(count)),
            message: format!("Loaded {count} task(s)."),
            notices,
        },
        Ok((Ok(FileOutcome::Cancelled), notices)) => FileActionResponse::cancelled(notices),
        Ok((Err(err), notices)) => {
            FileActionResponse::failure(format!("{operation} failed: {err}"), notices)
        }
        Err(err) => FileActionResponse::failure(format!("{operation} failed: {err}"), Vec::new()),
    }
}

/// Runs `f` against the window registered under `session_id`.
fn with_window<T>(session_id: u64, f: impl FnOnce(&mut Window) -> T) -> Result<T, String> {
    let mut registry = WINDOWS
        .lock()
        .map_err(|_| "session registry poisoned".to_string())?;
    match registry.windows.get_mut(&session_id) {
        Some(window) => Ok(f(window)),
        None => Err(format!("unknown session {session_id}")),
    }
}

fn open_window() -> Result<Window, String> {
    let config = AppConfig::global().map_err(|err| format!("config invalid: {err}"))?;
    let picker = Arc::new(PresetPicker::new());
    let session = TaskSession::open_with_config(
        config,
        BroadcastHub::global(),
        Arc::new(DefaultClock),
        Arc::clone(&picker),
        RecordingSink::new(),
    )
    .map_err(|err| {
        error!("event=ffi_session_open module=ffi status=error error={err}");
        err.to_string()
    })?;
    Ok(Window { session, picker })
}

fn effective_log_level(level: &str) -> Result<String, String> {
    let trimmed = level.trim();
    if !trimmed.is_empty() {
        return Ok(trimmed.to_string());
    }
    AppConfig::global()
        .map(|config| config.log_level.clone())
        .map_err(|err| format!("config invalid: {err}"))
}

fn drain_notices(session: &mut FfiSession) -> Vec<NoticeItem> {
    session
        .ui_mut()
        .take_notices()
        .into_iter()
        .map(to_notice_item)
        .collect()
}

fn to_notice_item(notice: Notice) -> NoticeItem {
    NoticeItem {
        level: notice.level.as_str().to_string(),
        message: notice.message,
    }
}

fn to_items(tasks: &[Task]) -> Vec<TaskItem> {
    tasks.iter().map(to_item).collect()
}

fn to_item(task: &Task) -> TaskItem {
    TaskItem {
        id: task.id.to_string(),
        title: task.title.clone(),
        description: task.description.clone(),
        time: task.time.clone(),
        completed: task.completed,
        created_at: format_iso8601(&task.created_at),
        updated_at: task.updated_at.as_ref().map(format_iso8601),
    }
}

fn list_message(count: usize) -> String {
    if count == 0 {
        "No tasks.".to_string()
    } else {
        format!("Found {count} task(s).")
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, effective_log_level, init_logging, ping, session_close, session_open,
        sync_pump, task_add, task_counts, task_list, task_remove, task_toggle, task_update,
        tasks_export, tasks_load_from_file, tasks_replace_all, tasks_save_to_file,
    };
    use once_cell::sync::Lazy;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEST_DIR: Lazy<tempfile::TempDir> = Lazy::new(|| {
        let dir = tempfile::tempdir().expect("create test dir");
        std::env::set_var("TASKDECK_DB_PATH", dir.path().join("tasks.sqlite3"));
        std::env::set_var("TASKDECK_EXPORT_DIR", dir.path().join("downloads"));
        dir
    });

    fn test_dir() -> PathBuf {
        TEST_DIR.path().to_path_buf()
    }

    fn open() -> u64 {
        test_dir();
        let opened = session_open();
        assert!(opened.ok, "{}", opened.message);
        opened.session_id.expect("session id")
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn blank_log_level_falls_back_to_configured_level() {
        test_dir();
        assert_eq!(
            effective_log_level("  ").unwrap(),
            taskdeck_core::default_log_level()
        );
        assert_eq!(effective_log_level(" warn ").unwrap(), "warn");
    }

    #[test]
    fn task_lifecycle_round_trips_through_envelopes() {
        let session = open();
        let token = unique_token("lifecycle");
        let added = task_add(session, token.clone(), "details".to_string(), None);
        assert!(added.ok, "{}", added.message);
        assert_eq!(added.notices.len(), 1);
        assert_eq!(added.notices[0].level, "success");
        let task = added.task.expect("added task");
        assert!(task.created_at.ends_with('Z'));

        let toggled = task_toggle(session, task.id.clone());
        assert!(toggled.ok, "{}", toggled.message);
        assert!(toggled.task.expect("toggled task").completed);

        let updated = task_update(
            session,
            task.id.clone(),
            token.clone(),
            "new details".to_string(),
            Some("2026-10-20T09:00".to_string()),
        );
        assert!(updated.ok, "{}", updated.message);
        let updated = updated.task.expect("updated task");
        assert_eq!(updated.time.as_deref(), Some("2026-10-20T09:00"));
        assert!(updated.updated_at.is_some());

        let listed = task_list(session, "completed".to_string(), token.to_uppercase());
        assert!(listed.ok, "{}", listed.message);
        assert_eq!(listed.items.len(), 1);
        assert_eq!(listed.items[0].id, task.id);

        let removed = task_remove(session, task.id.clone());
        assert!(removed.ok, "{}", removed.message);
        assert!(task_list(session, "all".to_string(), token).items.is_empty());
        assert!(session_close(session));
    }

    #[test]
    fn two_windows_converge_through_sync_pump() {
        let first = open();
        let second = open();
        let token = unique_token("converge");

        let added = task_add(first, token.clone(), "shared".to_string(), None);
        assert!(added.ok, "{}", added.message);
        let id = added.task.expect("added task").id;

        let pumped = sync_pump(second);
        assert!(pumped.ok, "{}", pumped.message);
        assert!(pumped.applied >= 1);
        assert!(pumped.items.iter().any(|item| item.id == id));
        assert!(pumped.notices.iter().any(|notice| notice.level == "info"));

        let toggled = task_toggle(second, id.clone());
        assert!(toggled.ok, "{}", toggled.message);
        let pumped = sync_pump(first);
        assert!(pumped.applied >= 1);
        let mirrored = pumped
            .items
            .iter()
            .find(|item| item.id == id)
            .expect("task mirrored in first window");
        assert!(mirrored.completed);

        assert!(task_remove(first, id.clone()).ok);
        sync_pump(second);
        assert!(task_list(second, "all".to_string(), token).items.is_empty());

        assert!(session_close(first));
        assert!(session_close(second));
    }

    #[test]
    fn closed_session_is_rejected() {
        let session = open();
        assert!(session_close(session));
        assert!(!session_close(session));
        let response = task_add(session, "t".to_string(), "d".to_string(), None);
        assert!(!response.ok);
        assert!(response.message.contains("unknown session"));
        assert!(!task_counts(session).ok);
    }

    #[test]
    fn blank_title_is_rejected_with_error_notice() {
        let session = open();
        let response = task_add(session, "  ".to_string(), "details".to_string(), None);
        assert!(!response.ok);
        assert!(response.task.is_none());
        assert_eq!(response.notices.len(), 1);
        assert_eq!(response.notices[0].level, "error");
    }

    #[test]
    fn unknown_id_and_filter_are_reported() {
        let session = open();
        let response = task_toggle(session, "no-such-task".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("no-such-task"));

        let listed = task_list(session, "archived".to_string(), String::new());
        assert!(!listed.ok);
    }

    #[test]
    fn counts_include_new_task() {
        let session = open();
        let token = unique_token("counts");
        let added = task_add(session, token, "details".to_string(), None);
        assert!(added.ok, "{}", added.message);
        let counts = task_counts(session);
        assert!(counts.ok);
        assert!(counts.total >= 1);
        assert_eq!(counts.total, counts.completed + counts.pending);
    }

    #[test]
    fn replace_all_rejects_non_array_payload() {
        let session = open();
        let response = tasks_replace_all(session, r#"{"id": 1}"#.to_string());
        assert!(!response.ok);
        let response = tasks_replace_all(session, "not json".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("invalid JSON"));
    }

    #[test]
    fn dismissed_dialogs_are_cancelled_without_notices() {
        let session = open();
        let load = tasks_load_from_file(session, None);
        assert!(load.ok, "{}", load.message);
        assert!(load.cancelled);
        assert!(load.notices.is_empty());

        let save = tasks_save_to_file(session, None);
        assert!(save.ok, "{}", save.message);
        assert!(save.cancelled);
    }

    #[test]
    fn newly_chosen_save_path_replaces_remembered_file() {
        let session = open();
        let dir = test_dir();
        let first = dir.join(format!("{}.json", unique_token("first")));
        let second = dir.join(format!("{}.json", unique_token("second")));

        let saved = tasks_save_to_file(session, Some(first.display().to_string()));
        assert!(saved.ok, "{}", saved.message);
        assert_eq!(saved.path.as_deref(), Some(first.display().to_string().as_str()));

        let saved = tasks_save_to_file(session, Some(second.display().to_string()));
        assert!(saved.ok, "{}", saved.message);
        assert_eq!(saved.path.as_deref(), Some(second.display().to_string().as_str()));
        assert!(second.exists());

        let resaved = tasks_save_to_file(session, None);
        assert_eq!(resaved.path.as_deref(), Some(second.display().to_string().as_str()));
    }

    #[test]
    fn export_writes_dated_file() {
        let session = open();
        let dir = test_dir();
        let exported = tasks_export(session);
        assert!(exported.ok, "{}", exported.message);
        let path = PathBuf::from(exported.path.expect("export path"));
        assert!(path.starts_with(dir.join("downloads")));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("taskdeck-tasks-"));
        assert!(name.ends_with(".json"));
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
