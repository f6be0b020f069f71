//! Case-insensitive substring filter over note content.
//!
//! # Invariants
//! - Result order equals input order.
//! - An empty query matches every note.
//! - Query text is used as typed; surrounding whitespace is significant.

use crate::model::note::Note;

/// Normalized search query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
    needle: String,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let needle = text.to_lowercase();
        Self { text, needle }
    }

    /// Query text as provided by the caller.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns whether `note` content contains the query, ignoring case.
    pub fn matches(&self, note: &Note) -> bool {
        self.needle.is_empty() || note.content.to_lowercase().contains(&self.needle)
    }
}

/// Returns the ordered sub-sequence of `notes` matching `query`.
pub fn filter_notes<'a>(notes: &'a [Note], query: &SearchQuery) -> Vec<&'a Note> {
    notes.iter().filter(|note| query.matches(note)).collect()
}
