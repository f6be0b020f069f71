//! FFI use-case API for the note widget UI.
//!
//! # Responsibility
//! - Expose note list/search/create/delete to the UI shell via FRB.
//! - Translate store errors into user-facing messages.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every call runs to completion: storage is consistent on return.
//! - The collection is loaded once, on the first call that needs it, and
//!   served from memory afterwards. Calls are serialized process-wide.

use chrono::{DateTime, Utc};
use jotter_core::db::open_db;
use jotter_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, JotterConfig, Note,
    NoteId, NoteStore, SearchQuery, SqliteStorage, StoreError,
};
use log::{info, warn};
use std::sync::{Mutex, OnceLock};

static CONFIG: OnceLock<JotterConfig> = OnceLock::new();
static STORE: Mutex<Option<NoteStore<SqliteStorage>>> = Mutex::new(None);

/// Returns the Rust core version string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Card-ready projection of one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    /// Stable note ID in string form; the deletion key.
    pub id: String,
    /// Creation timestamp, RFC 3339.
    pub date: String,
    /// Relative age label, e.g. `3 days ago`.
    pub age: String,
    pub content: String,
}

/// List/search response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesListResponse {
    /// Matching notes, newest first.
    pub items: Vec<NoteItem>,
    /// Collection size before filtering.
    pub total: u32,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Mutation response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteActionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Affected note, when one exists.
    pub note_id: Option<String>,
    /// Message suitable for a toast notification.
    pub message: String,
}

impl NoteActionResponse {
    fn success(message: impl Into<String>, note_id: Option<NoteId>) -> Self {
        Self {
            ok: true,
            note_id: note_id.map(|id| id.to_string()),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            note_id: None,
            message: message.into(),
        }
    }
}

/// Lists every note, newest first.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_list() -> NotesListResponse {
    notes_search(String::new())
}

/// Lists notes whose content contains `query`, ignoring case.
///
/// # FFI contract
/// - Empty query returns the full collection.
/// - Safe to call on every keystroke.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_search(query: String) -> NotesListResponse {
    let query = SearchQuery::new(query);
    let result = with_store(|store| {
        let now = Utc::now();
        let items = store
            .search(&query)
            .into_iter()
            .map(|note| to_note_item(note, now))
            .collect::<Vec<_>>();
        Ok((items, store.len()))
    });

    match result {
        Ok((items, total)) => {
            let message = if items.is_empty() {
                "No notes.".to_string()
            } else {
                format!("Showing {} of {total} note(s).", items.len())
            };
            NotesListResponse {
                items,
                total: u32::try_from(total).unwrap_or(u32::MAX),
                message,
            }
        }
        Err(message) => NotesListResponse {
            items: Vec::new(),
            total: 0,
            message: format!("notes_search failed: {message}"),
        },
    }
}

/// Creates a note from typed or dictated content.
///
/// # FFI contract
/// - Blank content returns `ok=false` and leaves storage untouched.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_create(content: String) -> NoteActionResponse {
    match with_store(|store| store.create(content)) {
        Ok(note) => NoteActionResponse::success("Note created.", Some(note.id)),
        Err(message) => NoteActionResponse::failure(message),
    }
}

/// Deletes a note by id. Unknown ids are not an error.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_delete(id: String) -> NoteActionResponse {
    let note_id = match NoteId::parse_str(id.trim()) {
        Ok(note_id) => note_id,
        Err(_) => return NoteActionResponse::failure(format!("invalid note id `{id}`")),
    };

    match with_store(|store| store.delete(note_id)) {
        Ok(true) => NoteActionResponse::success("Note deleted.", Some(note_id)),
        Ok(false) => NoteActionResponse::success("No note matched.", None),
        Err(message) => NoteActionResponse::failure(message),
    }
}

fn config() -> &'static JotterConfig {
    CONFIG.get_or_init(|| {
        JotterConfig::from_env().unwrap_or_else(|err| {
            warn!("event=config_load module=ffi status=fallback error={err}");
            JotterConfig::default()
        })
    })
}

fn with_store<T>(
    f: impl FnOnce(&mut NoteStore<SqliteStorage>) -> Result<T, StoreError>,
) -> Result<T, String> {
    let mut slot = STORE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if slot.is_none() {
        *slot = Some(open_store(config())?);
    }
    let Some(store) = slot.as_mut() else {
        return Err("notes store unavailable".to_string());
    };
    f(store).map_err(user_message)
}

fn open_store(config: &JotterConfig) -> Result<NoteStore<SqliteStorage>, String> {
    let conn = open_db(&config.db_path).map_err(|err| format!("notes DB open failed: {err}"))?;
    let storage =
        SqliteStorage::try_new(conn).map_err(|err| format!("notes storage init failed: {err}"))?;
    let store = NoteStore::initialize_with(storage, config.store_options())
        .map_err(|err| format!("notes load failed: {err}"))?;
    info!("event=store_open module=ffi status=ok count={}", store.len());
    Ok(store)
}

fn user_message(err: StoreError) -> String {
    match err {
        StoreError::Validation(_) => "A note cannot be empty.".to_string(),
        other => other.to_string(),
    }
}

fn to_note_item(note: &Note, now: DateTime<Utc>) -> NoteItem {
    NoteItem {
        id: note.id.to_string(),
        date: note.date.to_rfc3339(),
        age: note.relative_age(now),
        content: note.content.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, notes_create, notes_delete, notes_list, notes_search, CONFIG,
    };
    use jotter_core::db::open_db;
    use jotter_core::{JotterConfig, KeyValueStorage, NoteId, SqliteStorage};
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn core_version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/jotter-logs".to_string());
        assert!(error.contains("unsupported log level"));
    }

    #[test]
    fn created_note_is_listed_and_searchable() {
        use_test_db();
        let token = unique_token("ffi-create");
        let created = notes_create(format!("Remember {token}"));
        assert!(created.ok, "{}", created.message);
        let created_id = created.note_id.expect("created note should return id");

        let listed = notes_list();
        assert!(listed.items.iter().any(|item| item.id == created_id));

        let found = notes_search(token.to_uppercase());
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].id, created_id);
        assert_eq!(found.items[0].age, "less than a minute ago");
    }

    #[test]
    fn blank_note_is_rejected_with_user_message() {
        use_test_db();
        let response = notes_create("   ".to_string());
        assert!(!response.ok);
        assert_eq!(response.message, "A note cannot be empty.");
        assert!(response.note_id.is_none());
    }

    #[test]
    fn delete_removes_note_and_tolerates_unknown_ids() {
        use_test_db();
        let token = unique_token("ffi-delete");
        let created = notes_create(token.clone());
        let id = created.note_id.expect("created note should return id");

        let deleted = notes_delete(id.clone());
        assert!(deleted.ok, "{}", deleted.message);
        assert_eq!(deleted.note_id.as_deref(), Some(id.as_str()));
        assert!(notes_search(token).items.is_empty());

        let again = notes_delete(id);
        assert!(again.ok);
        assert!(again.note_id.is_none());
    }

    #[test]
    fn delete_rejects_malformed_id() {
        let response = notes_delete("not-a-uuid".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("invalid note id"));
    }

    #[test]
    fn loaded_collection_is_served_from_memory() {
        let config = use_test_db();
        let token = unique_token("ffi-loaded");
        assert!(notes_create(format!("kept {token}")).ok);

        let outside = unique_token("ffi-outside");
        let blob = format!(
            r#"[{{"id":"{}","date":"2024-02-01T12:34:56.789Z","content":"{outside}"}}]"#,
            NoteId::new_v4()
        );
        let mut storage = SqliteStorage::try_new(open_db(&config.db_path).unwrap()).unwrap();
        storage.set_item(&config.storage_key, &blob).unwrap();

        assert!(notes_search(outside).items.is_empty());
        assert_eq!(notes_search(token).items.len(), 1);
    }

    fn use_test_db() -> &'static JotterConfig {
        CONFIG.get_or_init(|| JotterConfig {
            db_path: std::env::temp_dir()
                .join(format!("jotter-ffi-test-{}.sqlite3", std::process::id())),
            ..JotterConfig::default()
        })
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
