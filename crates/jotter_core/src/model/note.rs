//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical persisted note record.
//! - Enforce creation invariants (stable id, non-blank content).
//! - Provide card projections (relative age label, text preview).
//!
//! # Invariants
//! - `id` is never nil and never reused for another note.
//! - `content` is never empty or whitespace-only.
//! - `date` is assigned once at creation and never changes.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Stable identifier of a note, used as the deletion key.
pub type NoteId = Uuid;

/// Validation errors for note construction and decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Content is empty or whitespace-only.
    EmptyContent,
    /// Nil UUID is reserved and cannot identify a note.
    NilId,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "note content must not be empty"),
            Self::NilId => write!(f, "note id must not be nil"),
        }
    }
}

impl Error for NoteValidationError {}

/// Persisted note record.
///
/// Serialized as `{"id", "date", "content"}` inside the single JSON array
/// blob kept in durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNote")]
pub struct Note {
    pub id: NoteId,
    /// Creation timestamp, RFC 3339 on the wire.
    pub date: DateTime<Utc>,
    pub content: String,
}

#[derive(Deserialize)]
struct RawNote {
    id: NoteId,
    date: DateTime<Utc>,
    content: String,
}

impl TryFrom<RawNote> for Note {
    type Error = NoteValidationError;

    fn try_from(value: RawNote) -> Result<Self, Self::Error> {
        Note::with_id(value.id, value.date, value.content)
    }
}

impl Note {
    /// Creates a note with a fresh v4 id and the current timestamp.
    ///
    /// # Errors
    /// - `EmptyContent` when `content` is blank after trim.
    pub fn new(content: impl Into<String>) -> Result<Self, NoteValidationError> {
        Self::with_id(Uuid::new_v4(), Utc::now(), content)
    }

    /// Creates a note with caller-provided identity and timestamp.
    ///
    /// Used by rehydration and import paths where identity already exists.
    pub fn with_id(
        id: NoteId,
        date: DateTime<Utc>,
        content: impl Into<String>,
    ) -> Result<Self, NoteValidationError> {
        let note = Self {
            id,
            date,
            content: content.into(),
        };
        note.validate()?;
        Ok(note)
    }

    /// Checks record invariants.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.id.is_nil() {
            return Err(NoteValidationError::NilId);
        }
        if self.content.trim().is_empty() {
            return Err(NoteValidationError::EmptyContent);
        }
        Ok(())
    }

    /// Relative creation age with suffix, e.g. `3 days ago`.
    pub fn relative_age(&self, now: DateTime<Utc>) -> String {
        format_relative_age(self.date, now)
    }

    /// Card preview: whitespace collapsed, truncated to `max_chars`.
    pub fn preview(&self, max_chars: usize) -> String {
        let normalized = WHITESPACE_RE.replace_all(self.content.trim(), " ");
        if normalized.chars().count() <= max_chars {
            return normalized.into_owned();
        }
        let mut truncated = normalized.chars().take(max_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

/// Formats the distance from `date` to `now` as an English phrase.
///
/// Thresholds:
/// - under 45 seconds -> `less than a minute ago`
/// - under 45 minutes -> `N minute(s) ago`
/// - under 24 hours -> `about N hour(s) ago`
/// - under 30 days -> `N day(s) ago`
/// - under 12 months -> `about N month(s) ago`
/// - otherwise -> `about N year(s) ago`
///
/// Dates after `now` clamp to zero.
pub fn format_relative_age(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - date).num_seconds().max(0);
    let minutes = (seconds + 30) / 60;
    let hours = (minutes + 30) / 60;
    let days = (hours + 12) / 24;
    let months = (days + 15) / 30;

    if seconds < 45 {
        "less than a minute ago".to_string()
    } else if minutes < 45 {
        format!("{} ago", plural(minutes.max(1), "minute"))
    } else if hours < 24 {
        format!("about {} ago", plural(hours.max(1), "hour"))
    } else if days < 30 {
        format!("{} ago", plural(days.max(1), "day"))
    } else if months < 12 {
        format!("about {} ago", plural(months.max(1), "month"))
    } else {
        format!("about {} ago", plural((months / 12).max(1), "year"))
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::{format_relative_age, Note};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn relative_age_covers_each_bucket() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let cases = [
            (Duration::seconds(10), "less than a minute ago"),
            (Duration::minutes(1), "1 minute ago"),
            (Duration::minutes(5), "5 minutes ago"),
            (Duration::hours(3), "about 3 hours ago"),
            (Duration::days(1), "1 day ago"),
            (Duration::days(3), "3 days ago"),
            (Duration::days(61), "about 2 months ago"),
            (Duration::days(400), "about 1 year ago"),
        ];
        for (offset, expected) in cases {
            assert_eq!(format_relative_age(now - offset, now), expected);
        }
    }

    #[test]
    fn relative_age_clamps_future_dates() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let label = format_relative_age(now + Duration::hours(2), now);
        assert_eq!(label, "less than a minute ago");
    }

    #[test]
    fn preview_collapses_whitespace_and_truncates() {
        let note = Note::new("  first line\n\n\tsecond   line  ").unwrap();
        assert_eq!(note.preview(100), "first line second line");
        assert_eq!(note.preview(5), "first...");
    }
}
