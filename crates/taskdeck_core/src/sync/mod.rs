//! Cross-session synchronization.
//!
//! # Responsibility
//! - Define the broadcast message taxonomy and its wire envelope.
//! - Apply received messages through pure reducers.
//! - Deliver messages between sessions sharing one topic.
//!
//! # Invariants
//! - Originating sessions apply and persist before broadcasting.
//! - Receivers trust payloads; the last applied message wins.

pub mod channel;
pub mod message;
pub mod reducer;
pub mod synchronizer;
