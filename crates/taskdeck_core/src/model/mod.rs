//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical `Task` record shared by store, persistence and sync.
//! - Provide injectable id generation and timestamp helpers.
//!
//! # Invariants
//! - Every task is identified by a `TaskId` that never changes.
//! - `created_at` is set once at creation and never rewritten.

pub mod id;
pub mod task;
pub mod timestamp;
