//! Core domain logic for Taskdeck.
//! This crate is the single source of truth for task-list invariants,
//! local persistence and cross-session synchronization.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod persist;
pub mod service;
pub mod store;
pub mod sync;

pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::id::{IdGenerator, SequentialIdGenerator, TaskId, UuidIdGenerator};
pub use model::task::{Task, TaskValidationError};
pub use persist::error::{PersistError, PersistResult};
pub use persist::file_access::{
    export_file_name, select_file_access, ExportSettings, FileAccess, FileAccessKind, FileOutcome,
    FilePicker, HandleFileAccess, HostCapabilities, PresetPicker, TransferFileAccess,
};
pub use persist::local_store::{
    KeyValueStore, LoadOutcome, LocalSnapshotStore, MemoryKeyValueStore, SqliteKeyValueStore,
};
pub use service::task_session::{SessionError, SessionResult, TaskSession};
pub use service::ui::{Notice, NoticeLevel, RecordingSink, UiSink};
pub use store::task_store::{StatusFilter, StoreError, StoreResult, TaskCounts, TaskStore};
pub use sync::channel::{BroadcastChannel, BroadcastHub, SyncError};
pub use sync::message::{SyncMessage, ToggledPayload};
pub use sync::reducer::{reduce, ReduceOutcome};
pub use sync::synchronizer::TabSynchronizer;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
