//! Merge-on-upload contract

mod common;

use common::{MemoryObjectStore, build_daily_db, daily_db_bytes, date, entries_of_bytes, entry};
use newsvault::error::AppError;
use newsvault::storage::local::LocalNewsStore;
use newsvault::storage::remote::RemoteNewsStore;
use newsvault::storage::sync::SyncEngine;
use tempfile::TempDir;

fn engine(store: &MemoryObjectStore, dir: &TempDir) -> SyncEngine<MemoryObjectStore> {
    SyncEngine::new(
        RemoteNewsStore::new(store.clone()),
        LocalNewsStore::new(dir.path()),
    )
}

#[tokio::test]
async fn push_uploads_fresh_file_when_remote_is_absent() {
    let store = MemoryObjectStore::new();
    let dir = TempDir::new().unwrap();
    let day = date("2025-12-17");

    build_daily_db(
        &dir.path().join("2025-12-17.db"),
        &[entry("https://example.com/a", "a"), entry("https://example.com/b", "b")],
    )
    .await;

    let engine = engine(&store, &dir);
    let report = engine.push(day).await.unwrap();

    assert!(!report.merged);
    assert_eq!(report.entries, 2);
    assert!(engine.remote().exists(day).await.unwrap());

    let uploaded = entries_of_bytes(&store.bytes_for(day).unwrap()).await;
    assert_eq!(uploaded.len(), 2);
}

#[tokio::test]
async fn push_merges_into_existing_remote_local_wins() {
    let store = MemoryObjectStore::new();
    let day = date("2025-12-17");
    store.insert_date(
        day,
        daily_db_bytes(&[
            entry("https://example.com/a", "remote-a"),
            entry("https://example.com/b", "remote-b"),
        ])
        .await,
    );

    let dir = TempDir::new().unwrap();
    build_daily_db(
        &dir.path().join("2025-12-17.db"),
        &[
            entry("https://example.com/a", "local-a"),
            entry("https://example.com/c", "local-c"),
        ],
    )
    .await;

    let report = engine(&store, &dir).push(day).await.unwrap();

    assert!(report.merged);
    assert_eq!(report.entries, 3);

    let merged = entries_of_bytes(&store.bytes_for(day).unwrap()).await;
    let titles: Vec<_> = merged.iter().map(|e| e.title.as_str()).collect();
    // Ordered by URL: a (local wins), b (remote kept), c (local added)
    assert_eq!(titles, vec!["local-a", "remote-b", "local-c"]);
}

#[tokio::test]
async fn repeated_push_does_not_duplicate_entries() {
    let store = MemoryObjectStore::new();
    let day = date("2025-12-17");
    store.insert_date(
        day,
        daily_db_bytes(&[entry("https://example.com/a", "remote-a")]).await,
    );

    let dir = TempDir::new().unwrap();
    build_daily_db(
        &dir.path().join("2025-12-17.db"),
        &[
            entry("https://example.com/a", "local-a"),
            entry("https://example.com/b", "local-b"),
        ],
    )
    .await;

    let engine = engine(&store, &dir);
    let first = engine.push(day).await.unwrap();
    let second = engine.push(day).await.unwrap();

    assert_eq!(first.entries, 2);
    assert_eq!(second.entries, 2);

    let merged = entries_of_bytes(&store.bytes_for(day).unwrap()).await;
    assert_eq!(merged.len(), 2);
    let titles: Vec<_> = merged.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["local-a", "local-b"]);
}

#[tokio::test]
async fn push_requires_a_local_daily_file() {
    let store = MemoryObjectStore::new();
    let dir = TempDir::new().unwrap();

    let error = engine(&store, &dir)
        .push(date("2025-12-17"))
        .await
        .unwrap_err();

    assert!(matches!(error, AppError::LocalIo(_)));
    assert_eq!(store.network_calls(), 0);
}

#[tokio::test]
async fn push_surfaces_transfer_failures() {
    let store = MemoryObjectStore::new();
    let day = date("2025-12-17");
    store.fail_date(day);

    let dir = TempDir::new().unwrap();
    build_daily_db(
        &dir.path().join("2025-12-17.db"),
        &[entry("https://example.com/a", "a")],
    )
    .await;

    let error = engine(&store, &dir).push(day).await.unwrap_err();
    assert!(matches!(error, AppError::RemoteTransfer { .. }));
}
