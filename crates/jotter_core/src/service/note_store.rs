//! Note collection store.
//!
//! # Responsibility
//! - Own the in-memory note collection and its storage port.
//! - Rehydrate once at startup and persist the full collection on every
//!   mutation.
//! - Enforce the non-blank content invariant on create.
//!
//! # Invariants
//! - Collection order is newest first; `create` prepends.
//! - Note ids are unique within the collection.
//! - After any mutating call returns, memory equals what storage holds:
//!   the next collection replaces memory only after the write succeeded.
//! - Note content is never written to logs.

use crate::model::note::{Note, NoteId, NoteValidationError};
use crate::search::filter::{filter_notes, SearchQuery};
use crate::storage::{KeyValueStorage, StorageError};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key holding the serialized note array.
pub const DEFAULT_STORAGE_KEY: &str = "notes";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store error for load and mutation paths.
#[derive(Debug)]
pub enum StoreError {
    /// Caller input violates note invariants; nothing was mutated.
    Validation(NoteValidationError),
    /// Storage backend failed to read or write.
    Storage(StorageError),
    /// Persisted blob exists but cannot be decoded into notes.
    Corrupt { key: String, message: String },
    /// Collection could not be encoded for persistence.
    Serialize(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Corrupt { key, message } => {
                write!(f, "persisted notes under `{key}` are malformed: {message}")
            }
            Self::Serialize(message) => write!(f, "failed to encode notes: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Corrupt { .. } | Self::Serialize(_) => None,
        }
    }
}

impl From<NoteValidationError> for StoreError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Behavior when the persisted blob is present but malformed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Surface `StoreError::Corrupt` and refuse to start.
    #[default]
    Fail,
    /// Start with an empty collection. Storage is left untouched until the
    /// next mutation overwrites it.
    Reset,
}

impl LoadPolicy {
    /// Parses `fail` or `reset` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fail" => Some(Self::Fail),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

/// Options applied at store initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub storage_key: String,
    pub on_corrupt: LoadPolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            on_corrupt: LoadPolicy::default(),
        }
    }
}

/// Single source of truth for the note collection.
pub struct NoteStore<S: KeyValueStorage> {
    storage: S,
    key: String,
    notes: Vec<Note>,
}

impl<S: KeyValueStorage> NoteStore<S> {
    /// Rehydrates a store from `storage` with default options.
    pub fn initialize(storage: S) -> StoreResult<Self> {
        Self::initialize_with(storage, StoreOptions::default())
    }

    /// Rehydrates a store from `storage`.
    ///
    /// A missing key yields an empty collection.
    ///
    /// # Errors
    /// - `Storage` when the backend read fails.
    /// - `Corrupt` when the blob is malformed and the policy is `Fail`.
    pub fn initialize_with(storage: S, options: StoreOptions) -> StoreResult<Self> {
        let StoreOptions {
            storage_key,
            on_corrupt,
        } = options;

        let notes = match storage.get_item(&storage_key)? {
            None => {
                debug!("event=store_load module=store status=empty key={storage_key}");
                Vec::new()
            }
            Some(blob) => match decode_notes(&blob) {
                Ok(notes) => notes,
                Err(message) if on_corrupt == LoadPolicy::Reset => {
                    warn!(
                        "event=store_load module=store status=reset key={storage_key} error={message}"
                    );
                    Vec::new()
                }
                Err(message) => {
                    error!(
                        "event=store_load module=store status=error key={storage_key} error_code=corrupt_blob error={message}"
                    );
                    return Err(StoreError::Corrupt {
                        key: storage_key,
                        message,
                    });
                }
            },
        };

        info!(
            "event=store_load module=store status=ok key={storage_key} count={}",
            notes.len()
        );
        Ok(Self {
            storage,
            key: storage_key,
            notes,
        })
    }

    /// Notes in maintained order, newest first.
    pub fn list(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Storage key this store persists under.
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Filters the collection by case-insensitive content substring.
    pub fn search(&self, query: &SearchQuery) -> Vec<&Note> {
        filter_notes(&self.notes, query)
    }

    /// Creates a note from `content`, prepends it and persists.
    ///
    /// # Errors
    /// - `Validation(EmptyContent)` for blank content; nothing is written.
    /// - `Storage` / `Serialize` when persisting fails; memory is unchanged.
    pub fn create(&mut self, content: impl Into<String>) -> StoreResult<Note> {
        let content = content.into();
        let note = loop {
            let candidate = match Note::new(content.as_str()) {
                Ok(note) => note,
                Err(err) => {
                    warn!("event=note_create module=store status=rejected reason={err}");
                    return Err(err.into());
                }
            };
            if self.get(candidate.id).is_none() {
                break candidate;
            }
        };

        let mut next = Vec::with_capacity(self.notes.len() + 1);
        next.push(note.clone());
        next.extend(self.notes.iter().cloned());
        self.commit(next, "note_create")?;

        info!(
            "event=note_create module=store status=ok note_id={} count={}",
            note.id,
            self.notes.len()
        );
        Ok(note)
    }

    /// Removes the note with `id` and persists the result.
    ///
    /// Returns whether a note was removed. The collection is persisted even
    /// when no note matched.
    pub fn delete(&mut self, id: NoteId) -> StoreResult<bool> {
        let next = self
            .notes
            .iter()
            .filter(|note| note.id != id)
            .cloned()
            .collect::<Vec<_>>();
        let removed = next.len() != self.notes.len();
        self.commit(next, "note_delete")?;

        info!(
            "event=note_delete module=store status=ok note_id={id} removed={removed} count={}",
            self.notes.len()
        );
        Ok(removed)
    }

    /// Read access to the storage port.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Releases the storage port.
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn commit(&mut self, next: Vec<Note>, event: &'static str) -> StoreResult<()> {
        let blob = serde_json::to_string(&next).map_err(|err| {
            error!("event={event} module=store status=error error_code=encode_failed error={err}");
            StoreError::Serialize(err.to_string())
        })?;

        if let Err(err) = self.storage.set_item(&self.key, &blob) {
            error!("event={event} module=store status=error error_code=write_failed error={err}");
            return Err(err.into());
        }

        self.notes = next;
        Ok(())
    }
}

fn decode_notes(blob: &str) -> Result<Vec<Note>, String> {
    let notes: Vec<Note> = serde_json::from_str(blob).map_err(|err| err.to_string())?;

    let mut seen = HashSet::with_capacity(notes.len());
    for note in &notes {
        if !seen.insert(note.id) {
            return Err(format!("duplicate note id {}", note.id));
        }
    }

    Ok(notes)
}
