//! Task identity and id generation.
//!
//! # Responsibility
//! - Define `TaskId`, accepting both numeric and text ids on the wire.
//! - Provide injectable generators so creation never depends on wall time alone.
//!
//! # Invariants
//! - A generator never yields the same id twice within one instance.

use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable task identifier.
///
/// Snapshots written by older builds carry numeric (time-based) ids; current
/// builds write UUID text ids. Both shapes are preserved as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Number(u64),
    Text(String),
}

impl TaskId {
    /// Parses an id received as text from the UI layer.
    ///
    /// All-digit input maps to `Number`, anything else to `Text`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<u64>() {
            Ok(value) => Self::Number(value),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }

    /// Returns whether this id carries no usable value.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Text(value) => value.trim().is_empty(),
        }
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<u64> for TaskId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Uuid> for TaskId {
    fn from(value: Uuid) -> Self {
        Self::Text(value.to_string())
    }
}

/// Source of fresh task ids.
pub trait IdGenerator: Send {
    fn next_id(&mut self) -> TaskId;
}

/// Generates random UUID v4 text ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&mut self) -> TaskId {
        TaskId::from(Uuid::new_v4())
    }
}

/// Generates strictly increasing numeric ids.
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    next: u64,
}

impl SequentialIdGenerator {
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Seeds the sequence with the clock's epoch milliseconds.
    ///
    /// Keeps ids shaped like legacy time-based ids while staying unique under
    /// rapid successive creation.
    pub fn from_clock(clock: &dyn Clock) -> Self {
        let millis = clock.utc().timestamp_millis().max(0) as u64;
        Self::starting_at(millis)
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> TaskId {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        TaskId::Number(id)
    }
}
