//! Flutter-facing bindings for Jotter core.

pub mod api;
