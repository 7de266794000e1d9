//! Flutter-facing bindings over `taskdeck_core`.

pub mod api;
