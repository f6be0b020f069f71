//! Note search entry points.
//!
//! # Responsibility
//! - Derive the visible note subset from a live query string.
//! - Stay pure so callers can recompute on every keystroke.

pub mod filter;
