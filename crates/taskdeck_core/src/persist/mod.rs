//! Durable snapshot persistence.
//!
//! # Responsibility
//! - Encode/decode full task-list snapshots.
//! - Save/load snapshots to the local key/value slot and to user files.
//!
//! # Invariants
//! - Every channel writes the full list, never deltas.
//! - Local store and file channel share one JSON shape.
//! - A failed save never touches the in-memory list.

pub mod error;
pub mod file_access;
pub mod local_store;
pub mod snapshot;
