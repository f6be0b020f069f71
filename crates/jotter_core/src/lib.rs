//! Core domain logic for Jotter.
//! This crate is the single source of truth for note invariants.

pub mod config;
pub mod db;
pub mod dictation;
pub mod logging;
pub mod model;
pub mod search;
pub mod service;
pub mod storage;

pub use config::{ConfigError, JotterConfig};
pub use dictation::composer::{ComposerState, NoteComposer};
pub use dictation::stream::{
    transcript_channel, DictationError, DictationRequest, DictationSession, SpeechRecognizer,
    TranscriptEvent, TranscriptSender,
};
pub use logging::{default_log_level, init_logging, LoggingError};
pub use model::note::{format_relative_age, Note, NoteId, NoteValidationError};
pub use search::filter::{filter_notes, SearchQuery};
pub use service::note_store::{
    LoadPolicy, NoteStore, StoreError, StoreOptions, StoreResult, DEFAULT_STORAGE_KEY,
};
pub use storage::{KeyValueStorage, MemoryStorage, SqliteStorage, StorageError, StorageResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
