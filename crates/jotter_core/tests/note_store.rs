use jotter_core::{
    KeyValueStorage, LoadPolicy, MemoryStorage, NoteStore, NoteValidationError, SearchQuery,
    StorageError, StorageResult, StoreError, StoreOptions,
};
use std::collections::HashSet;
use uuid::Uuid;

/// Storage that accepts reads but rejects writes once `fail_writes` is set.
#[derive(Default)]
struct FlakyStorage {
    inner: MemoryStorage,
    fail_writes: bool,
}

impl KeyValueStorage for FlakyStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_writes {
            return Err(StorageError::WriteRejected("quota exceeded".to_string()));
        }
        self.inner.set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> StorageResult<()> {
        self.inner.remove_item(key)
    }
}

fn contents<S: KeyValueStorage>(store: &NoteStore<S>) -> Vec<&str> {
    store.list().iter().map(|n| n.content.as_str()).collect()
}

#[test]
fn empty_storage_initializes_empty_collection() {
    let store = NoteStore::initialize(MemoryStorage::new()).unwrap();
    assert!(store.is_empty());
    assert_eq!(store.storage_key(), "notes");
    assert_eq!(store.storage().raw("notes"), None);
}

#[test]
fn create_list_delete_scenario() {
    let mut store = NoteStore::initialize(MemoryStorage::new()).unwrap();

    let milk = store.create("Buy milk").unwrap();
    assert_eq!(contents(&store), vec!["Buy milk"]);

    store.create("Walk dog").unwrap();
    assert_eq!(contents(&store), vec!["Walk dog", "Buy milk"]);

    assert!(store.delete(milk.id).unwrap());
    assert_eq!(contents(&store), vec!["Walk dog"]);
}

#[test]
fn create_prepends_and_grows_by_one() {
    let mut store = NoteStore::initialize(MemoryStorage::new()).unwrap();
    for (index, content) in ["a", "b", "c", "d"].into_iter().enumerate() {
        let created = store.create(content).unwrap();
        assert_eq!(store.len(), index + 1);
        assert_eq!(store.list()[0], created);
    }

    let ids: HashSet<_> = store.list().iter().map(|note| note.id).collect();
    assert_eq!(ids.len(), store.len());
}

#[test]
fn blank_content_is_rejected_without_mutation_or_write() {
    let mut store = NoteStore::initialize(MemoryStorage::new()).unwrap();
    for content in ["", "   "] {
        let err = store.create(content).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(NoteValidationError::EmptyContent)
        ));
    }
    assert!(store.is_empty());
    assert_eq!(store.storage().raw("notes"), None);
}

#[test]
fn delete_removes_exactly_the_matching_note() {
    let mut store = NoteStore::initialize(MemoryStorage::new()).unwrap();
    let first = store.create("first").unwrap();
    let second = store.create("second").unwrap();
    let third = store.create("third").unwrap();

    assert!(store.delete(second.id).unwrap());
    assert_eq!(store.len(), 2);
    assert!(store.get(second.id).is_none());
    assert!(store.get(first.id).is_some());
    assert!(store.get(third.id).is_some());
}

#[test]
fn delete_unknown_id_keeps_collection_unchanged() {
    let mut store = NoteStore::initialize(MemoryStorage::new()).unwrap();
    store.create("keep me").unwrap();
    let before = store.list().to_vec();
    let persisted_before = store.storage().raw("notes").map(str::to_string);

    assert!(!store.delete(Uuid::new_v4()).unwrap());
    assert_eq!(store.list(), before.as_slice());
    assert_eq!(
        store.storage().raw("notes").map(str::to_string),
        persisted_before
    );
}

#[test]
fn delete_on_empty_store_writes_empty_array() {
    let mut store = NoteStore::initialize(MemoryStorage::new()).unwrap();
    assert!(!store.delete(Uuid::new_v4()).unwrap());
    assert_eq!(store.storage().raw("notes"), Some("[]"));
}

#[test]
fn reinitialize_reproduces_collection_after_mutations() {
    let mut store = NoteStore::initialize(MemoryStorage::new()).unwrap();
    store.create("one").unwrap();
    let two = store.create("two").unwrap();
    store.create("three").unwrap();
    store.delete(two.id).unwrap();
    store.create("four").unwrap();
    let expected = store.list().to_vec();

    let reloaded = NoteStore::initialize(store.into_storage()).unwrap();
    assert_eq!(reloaded.list(), expected.as_slice());
}

#[test]
fn custom_storage_key_is_used_for_persistence() {
    let options = StoreOptions {
        storage_key: "nlw-notes".to_string(),
        ..StoreOptions::default()
    };
    let mut store = NoteStore::initialize_with(MemoryStorage::new(), options).unwrap();
    store.create("scoped").unwrap();

    assert!(store.storage().raw("nlw-notes").is_some());
    assert_eq!(store.storage().raw("notes"), None);
}

#[test]
fn failed_write_leaves_memory_equal_to_storage() {
    let mut store = NoteStore::initialize(FlakyStorage::default()).unwrap();
    let kept = store.create("kept").unwrap();
    let persisted = store.storage().inner.raw("notes").map(str::to_string);

    let mut storage = store.into_storage();
    storage.fail_writes = true;
    let mut store = NoteStore::initialize(storage).unwrap();

    let err = store.create("lost").unwrap_err();
    assert!(matches!(err, StoreError::Storage(StorageError::WriteRejected(_))));
    let err = store.delete(kept.id).unwrap_err();
    assert!(matches!(err, StoreError::Storage(_)));

    assert_eq!(store.list().len(), 1);
    assert_eq!(store.list()[0], kept);
    assert_eq!(store.storage().inner.raw("notes").map(str::to_string), persisted);
}

#[test]
fn malformed_blob_fails_by_default() {
    let storage = MemoryStorage::with_item("notes", "{not json");
    let err = NoteStore::initialize(storage).err().unwrap();
    match err {
        StoreError::Corrupt { key, .. } => assert_eq!(key, "notes"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_blob_resets_when_policy_allows() {
    let options = StoreOptions {
        on_corrupt: LoadPolicy::Reset,
        ..StoreOptions::default()
    };
    let mut store =
        NoteStore::initialize_with(MemoryStorage::with_item("notes", "[{\"id\":1}]"), options)
            .unwrap();
    assert!(store.is_empty());
    assert_eq!(store.storage().raw("notes"), Some("[{\"id\":1}]"));

    store.create("fresh start").unwrap();
    let reloaded = NoteStore::initialize(store.into_storage()).unwrap();
    assert_eq!(contents(&reloaded), vec!["fresh start"]);
}

#[test]
fn blob_written_by_browser_app_is_rehydrated_in_order() {
    let blob = r#"[
        {"id":"8f14e45f-ceea-4e7a-9b2d-1c2b3a4d5e6f","date":"2024-03-02T10:00:00.000Z","content":"Newest"},
        {"id":"c9f0f895-fb98-4b91-8f2d-7a6b5c4d3e2f","date":"2024-03-01T09:30:00.000Z","content":"Oldest"}
    ]"#;
    let store = NoteStore::initialize(MemoryStorage::with_item("notes", blob)).unwrap();
    assert_eq!(contents(&store), vec!["Newest", "Oldest"]);
}

#[test]
fn search_delegates_to_case_insensitive_filter() {
    let mut store = NoteStore::initialize(MemoryStorage::new()).unwrap();
    store.create("Hello world").unwrap();
    store.create("Something else").unwrap();

    assert_eq!(store.search(&SearchQuery::new("HELLO")).len(), 1);
    assert_eq!(store.search(&SearchQuery::new("hello")).len(), 1);
    assert_eq!(store.search(&SearchQuery::new("")).len(), 2);
}
