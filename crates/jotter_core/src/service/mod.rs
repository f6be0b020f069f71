//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate storage calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod note_store;
