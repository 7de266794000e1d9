//! In-memory task store.
//!
//! # Responsibility
//! - Own the canonical task list of one session.
//! - Enforce intent-path invariants before any mutation.
//!
//! # Invariants
//! - The list never holds two tasks with the same id.
//! - Failed operations leave the list unchanged.

pub mod task_store;
