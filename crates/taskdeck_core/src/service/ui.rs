//! Presentation-facing sink contracts.

use crate::model::task::Task;

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// Transient user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Receiver of render requests and notices.
///
/// `render` gets the full list in display order (newest first); filtering and
/// search are applied by the UI through `TaskSession::list`.
pub trait UiSink: Send {
    fn render(&mut self, tasks: &[Task]);
    fn notify(&mut self, notice: Notice);
}

/// Sink that keeps the latest render and queued notices.
///
/// Used by hosts that poll instead of receiving callbacks.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub render_count: usize,
    pub last_render: Vec<Task>,
    pub notices: Vec<Notice>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns and clears queued notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

impl UiSink for RecordingSink {
    fn render(&mut self, tasks: &[Task]) {
        self.render_count += 1;
        self.last_render = tasks.to_vec();
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
