//! File channel: snapshot export/import through user-chosen files.
//!
//! # Responsibility
//! - Abstract file access behind one `FileAccess` capability.
//! - Provide the interactive handle strategy and the download/upload
//!   fallback, selected once from host capabilities.
//!
//! # Invariants
//! - Both strategies read and write the same snapshot shape as local storage.
//! - A dismissed picker is `FileOutcome::Cancelled`, never an error.
//! - Files are written atomically (temp file + rename).

use crate::model::task::Task;
use crate::persist::error::{PersistError, PersistResult};
use crate::persist::snapshot;
use chrono::NaiveDate;
use log::{info, warn};
use mockable::Clock;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Outcome of an interactive file operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome<T> {
    Completed(T),
    /// The user dismissed the picker.
    Cancelled,
}

/// Which strategy backs a `FileAccess` instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAccessKind {
    /// Interactive picker returning a reusable file handle.
    Handle,
    /// Classic download to a fixed directory plus user-selected upload.
    Transfer,
}

impl FileAccessKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Handle => "handle",
            Self::Transfer => "transfer",
        }
    }
}

/// Host-provided file picker.
///
/// `None` means the user dismissed the dialog.
pub trait FilePicker: Send + Sync {
    fn pick_save_path(&self, suggested_name: &str) -> Option<PathBuf>;
    fn pick_open_path(&self) -> Option<PathBuf>;
}

impl<P: FilePicker + ?Sized> FilePicker for Arc<P> {
    fn pick_save_path(&self, suggested_name: &str) -> Option<PathBuf> {
        (**self).pick_save_path(suggested_name)
    }

    fn pick_open_path(&self) -> Option<PathBuf> {
        (**self).pick_open_path()
    }
}

/// Picker answering from one-shot selections made ahead of the call.
///
/// UI hosts run their native dialog first and stage the result here; an
/// unstaged request behaves like a dismissed dialog.
#[derive(Debug, Default)]
pub struct PresetPicker {
    next_save: Mutex<Option<PathBuf>>,
    next_open: Mutex<Option<PathBuf>>,
}

impl PresetPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage_save(&self, path: Option<PathBuf>) {
        if let Ok(mut slot) = self.next_save.lock() {
            *slot = path;
        }
    }

    pub fn stage_open(&self, path: Option<PathBuf>) {
        if let Ok(mut slot) = self.next_open.lock() {
            *slot = path;
        }
    }
}

impl FilePicker for PresetPicker {
    fn pick_save_path(&self, _suggested_name: &str) -> Option<PathBuf> {
        self.next_save.lock().ok().and_then(|mut slot| slot.take())
    }

    fn pick_open_path(&self) -> Option<PathBuf> {
        self.next_open.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// File channel capability used by sessions.
pub trait FileAccess: Send {
    fn kind(&self) -> FileAccessKind;

    /// Writes the full list; returns the path written.
    fn save_snapshot(&mut self, tasks: &[Task]) -> PersistResult<FileOutcome<PathBuf>>;

    /// Reads a full list from a user-chosen file.
    fn load_snapshot(&mut self) -> PersistResult<FileOutcome<Vec<Task>>>;

    /// Drops the remembered save target so the next save asks the picker.
    fn forget_target(&mut self) {}
}

/// Host feature flags relevant to file access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    pub file_handles: bool,
}

/// Export naming settings shared by both strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    pub download_dir: PathBuf,
    pub file_prefix: String,
}

/// Builds `<prefix>-YYYY-MM-DD.json`.
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}-{}.json", date.format("%Y-%m-%d"))
}

/// Picks the handle strategy when the host supports it, else download/upload.
pub fn select_file_access<P>(
    capabilities: HostCapabilities,
    picker: P,
    settings: ExportSettings,
    clock: Arc<dyn Clock + Send + Sync>,
) -> Box<dyn FileAccess>
where
    P: FilePicker + 'static,
{
    let access: Box<dyn FileAccess> = if capabilities.file_handles {
        Box::new(HandleFileAccess::new(picker, settings, clock))
    } else {
        Box::new(TransferFileAccess::new(picker, settings, clock))
    };
    info!(
        "event=file_access_select module=persist status=ok strategy={}",
        access.kind().as_str()
    );
    access
}

/// Interactive strategy: the first save asks for a target and keeps the
/// handle, later saves overwrite the same file.
pub struct HandleFileAccess<P: FilePicker> {
    picker: P,
    settings: ExportSettings,
    clock: Arc<dyn Clock + Send + Sync>,
    handle: Option<PathBuf>,
}

impl<P: FilePicker> HandleFileAccess<P> {
    pub fn new(picker: P, settings: ExportSettings, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            picker,
            settings,
            clock,
            handle: None,
        }
    }

    /// Currently remembered file handle.
    pub fn handle(&self) -> Option<&Path> {
        self.handle.as_deref()
    }
}

impl<P: FilePicker> FileAccess for HandleFileAccess<P> {
    fn kind(&self) -> FileAccessKind {
        FileAccessKind::Handle
    }

    fn save_snapshot(&mut self, tasks: &[Task]) -> PersistResult<FileOutcome<PathBuf>> {
        let target = match self.handle.clone() {
            Some(path) => path,
            None => {
                let suggested = export_file_name(
                    &self.settings.file_prefix,
                    self.clock.utc().date_naive(),
                );
                match self.picker.pick_save_path(&suggested) {
                    Some(path) => path,
                    None => return Ok(FileOutcome::Cancelled),
                }
            }
        };
        write_snapshot_file(&target, tasks)?;
        self.handle = Some(target.clone());
        Ok(FileOutcome::Completed(target))
    }

    fn load_snapshot(&mut self) -> PersistResult<FileOutcome<Vec<Task>>> {
        let Some(path) = self.picker.pick_open_path() else {
            return Ok(FileOutcome::Cancelled);
        };
        let tasks = read_snapshot_file(&path)?;
        self.handle = Some(path);
        Ok(FileOutcome::Completed(tasks))
    }

    fn forget_target(&mut self) {
        self.handle = None;
    }
}

/// Fallback strategy: saves go to a dated file in the download directory,
/// loads read a user-selected upload.
pub struct TransferFileAccess<P: FilePicker> {
    picker: P,
    settings: ExportSettings,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl<P: FilePicker> TransferFileAccess<P> {
    pub fn new(picker: P, settings: ExportSettings, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            picker,
            settings,
            clock,
        }
    }
}

impl<P: FilePicker> FileAccess for TransferFileAccess<P> {
    fn kind(&self) -> FileAccessKind {
        FileAccessKind::Transfer
    }

    fn save_snapshot(&mut self, tasks: &[Task]) -> PersistResult<FileOutcome<PathBuf>> {
        std::fs::create_dir_all(&self.settings.download_dir)?;
        let target = self.settings.download_dir.join(export_file_name(
            &self.settings.file_prefix,
            self.clock.utc().date_naive(),
        ));
        write_snapshot_file(&target, tasks)?;
        Ok(FileOutcome::Completed(target))
    }

    fn load_snapshot(&mut self) -> PersistResult<FileOutcome<Vec<Task>>> {
        match self.picker.pick_open_path() {
            Some(path) => read_snapshot_file(&path).map(FileOutcome::Completed),
            None => Ok(FileOutcome::Cancelled),
        }
    }
}

/// Writes a pretty-printed snapshot atomically.
pub fn write_snapshot_file(path: &Path, tasks: &[Task]) -> PersistResult<()> {
    let text = snapshot::encode_pretty(tasks)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|err| PersistError::Io(err.error))?;
    info!(
        "event=file_save module=persist status=ok count={} bytes={}",
        tasks.len(),
        text.len()
    );
    Ok(())
}

/// Reads and decodes a snapshot file.
pub fn read_snapshot_file(path: &Path) -> PersistResult<Vec<Task>> {
    let text = std::fs::read_to_string(path)?;
    match snapshot::decode(&text) {
        Ok(tasks) => {
            info!(
                "event=file_load module=persist status=ok count={}",
                tasks.len()
            );
            Ok(tasks)
        }
        Err(err) => {
            warn!("event=file_load module=persist status=malformed error={err}");
            Err(err)
        }
    }
}
