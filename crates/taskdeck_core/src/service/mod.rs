//! Session use-case services.
//!
//! # Responsibility
//! - Orchestrate store mutation, local persistence, broadcast and rendering.
//! - Keep UI/FFI layers decoupled from storage and sync details.

pub mod task_session;
pub mod ui;
