//! Document store tests: insert/get and directory seeding with real files.

use rlm_server::DocumentStore;

#[test]
fn insert_and_get() {
    let store = DocumentStore::new();
    assert!(store.is_empty());

    store.insert("report", "Q3 revenue was 42.");
    assert_eq!(store.len(), 1);
    let doc = store.get("report").expect("document should exist");
    assert_eq!(doc.text, "Q3 revenue was 42.");
}

#[test]
fn get_unknown_is_none() {
    let store = DocumentStore::new();
    assert!(store.get("missing").is_none());
}

#[test]
fn insert_replaces_existing() {
    let store = DocumentStore::new();
    store.insert("doc", "old");
    store.insert("doc", "new");
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("doc").unwrap().text, "new");
}

#[test]
fn load_dir_reads_markdown_and_text_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.md"), "# Notes\ntotal: 42").unwrap();
    std::fs::write(dir.path().join("report.txt"), "plain text").unwrap();
    std::fs::write(dir.path().join("image.png"), [0u8; 4]).unwrap();

    let store = DocumentStore::new();
    let loaded = store.load_dir(dir.path()).expect("load_dir should succeed");

    assert_eq!(loaded, 2);
    assert_eq!(store.len(), 2);
    assert!(store.get("notes").unwrap().text.contains("total: 42"));
    assert_eq!(store.get("report").unwrap().text, "plain text");
    assert!(store.get("image").is_none());
}

#[test]
fn load_dir_on_missing_directory_errors() {
    let store = DocumentStore::new();
    assert!(store
        .load_dir(std::path::Path::new("/tmp/no-such-dir-ever"))
        .is_err());
}
