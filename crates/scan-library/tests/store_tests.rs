use scan_library::*;
use std::collections::HashSet;
use tempfile::TempDir;

async fn store() -> (TempDir, DocumentStore) {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::open(dir.path(), "pdf").await.unwrap();
    (dir, store)
}

#[test]
fn test_generated_names_never_collide() {
    let mut existing: HashSet<String> = HashSet::new();
    // Clock stuck, going backwards, and jumping forwards
    for now in [100, 100, 100, 50, 0, 1_000, 1_000, 999] {
        let name = generate_unique_name("scan", existing.iter().map(String::as_str), now);
        assert!(!existing.contains(&name), "{name} generated twice");
        existing.insert(name);
    }
    assert_eq!(existing.len(), 8);
}

#[tokio::test]
async fn test_write_then_list() {
    let (_dir, store) = store().await;
    let entry = store.write("Receipt", b"%PDF-1.5 fake").await.unwrap();
    assert_eq!(entry.id.as_str(), "Receipt.pdf");
    assert_eq!(entry.display_name, "Receipt");

    let listed = store.list().await.unwrap();
    assert_eq!(listed, vec![entry.clone()]);
    assert_eq!(store.read(&entry.id).await.unwrap(), b"%PDF-1.5 fake");
}

#[tokio::test]
async fn test_write_existing_name_collides() {
    let (_dir, store) = store().await;
    store.write("Receipt", b"one").await.unwrap();
    let result = store.write("Receipt", b"two").await;
    assert!(matches!(result, Err(StorageError::NameCollision(name)) if name == "Receipt.pdf"));
    let bytes = store.read(&DocumentHandle::from("Receipt.pdf")).await.unwrap();
    assert_eq!(bytes, b"one");
}

#[tokio::test]
async fn test_write_new_generates_distinct_names() {
    let (_dir, store) = store().await;
    let mut ids = HashSet::new();
    for _ in 0..5 {
        let entry = store.write_new(DEFAULT_BASE_NAME, b"x").await.unwrap();
        assert!(entry.display_name.starts_with("scannedDocument_"));
        ids.insert(entry.id);
    }
    assert_eq!(ids.len(), 5);
    assert_eq!(store.list().await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_write_new_next_to_maximal_suffix() {
    let (dir, store) = store().await;
    let stray = format!("{DEFAULT_BASE_NAME}_{}.pdf", u64::MAX);
    std::fs::write(dir.path().join(&stray), b"x").unwrap();

    let entry = store.write_new(DEFAULT_BASE_NAME, b"y").await.unwrap();
    assert_ne!(entry.id.as_str(), stray);
    assert_eq!(store.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_ignores_partial_and_foreign_files() {
    let (dir, store) = store().await;
    std::fs::write(dir.path().join(".half.pdf.partial"), b"half").unwrap();
    std::fs::write(dir.path().join(".hidden.pdf"), b"hidden").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"text").unwrap();
    std::fs::create_dir(dir.path().join("folder.pdf")).unwrap();
    store.write("visible", b"pdf").await.unwrap();

    let names: Vec<String> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id.to_string())
        .collect();
    assert_eq!(names, vec!["visible.pdf"]);
}

#[tokio::test]
async fn test_list_oldest_first() {
    let (_dir, store) = store().await;
    for name in ["b_first", "a_second", "c_third"] {
        store.write(name, b"x").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    let names: Vec<String> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.display_name)
        .collect();
    assert_eq!(names, vec!["b_first", "a_second", "c_third"]);
}

#[tokio::test]
async fn test_rename_moves_file() {
    let (dir, store) = store().await;
    let entry = store.write("old", b"data").await.unwrap();
    let renamed = store.rename(&entry.id, "  new name.pdf ").await.unwrap();
    assert_eq!(renamed.id.as_str(), "new name.pdf");
    assert_eq!(renamed.created_at, entry.created_at);
    assert!(!dir.path().join("old.pdf").exists());
    assert_eq!(std::fs::read(dir.path().join("new name.pdf")).unwrap(), b"data");
}

#[tokio::test]
async fn test_rename_to_same_name_is_noop() {
    let (_dir, store) = store().await;
    let entry = store.write("same", b"data").await.unwrap();
    let renamed = store.rename(&entry.id, "same").await.unwrap();
    assert_eq!(renamed.id, entry.id);
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rename_collision_leaves_both_files() {
    let (dir, store) = store().await;
    let a = store.write("a", b"A").await.unwrap();
    store.write("b", b"B").await.unwrap();
    let result = store.rename(&a.id, "b").await;
    assert!(matches!(result, Err(StorageError::NameCollision(_))));
    assert_eq!(std::fs::read(dir.path().join("a.pdf")).unwrap(), b"A");
    assert_eq!(std::fs::read(dir.path().join("b.pdf")).unwrap(), b"B");
}

#[tokio::test]
async fn test_rename_invalid_name() {
    let (_dir, store) = store().await;
    let entry = store.write("doc", b"x").await.unwrap();
    let result = store.rename(&entry.id, " ... ").await;
    assert!(matches!(result, Err(StorageError::InvalidName(_))));
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let (_dir, store) = store().await;
    let entry = store.write("doc", b"x").await.unwrap();
    store.delete(&entry.id).await.unwrap();
    assert!(matches!(
        store.delete(&entry.id).await,
        Err(StorageError::NotFound(id)) if id == entry.id
    ));
    assert!(matches!(
        store.read(&entry.id).await,
        Err(StorageError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_handles_cannot_escape_library() {
    let (_dir, store) = store().await;
    for bad in ["../outside.pdf", "nested/doc.pdf", ".hidden.pdf", ""] {
        let result = store.read(&DocumentHandle::from(bad)).await;
        assert!(
            matches!(result, Err(StorageError::InvalidName(_))),
            "{bad:?} was accepted"
        );
    }
}
