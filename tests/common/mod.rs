//! Common test utilities for sync tests

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use newsvault::data::{DailyFile, NewsEntry};
use newsvault::date::DateKey;
use newsvault::error::AppError;
use newsvault::storage::object_store::{ObjectMeta, ObjectStore};

/// In-memory object store with failure injection.
///
/// Clones share state, so tests can hold one handle for assertions while
/// the engine owns another.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    phantom_keys: Mutex<HashSet<String>>,
    failing_keys: Mutex<HashSet<String>>,
    fail_listing: AtomicBool,
    network_calls: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, data: Vec<u8>) {
        self.inner
            .objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data);
    }

    pub fn insert_date(&self, date: DateKey, data: Vec<u8>) {
        self.insert(&date.object_key(), data);
    }

    /// Advertise `date` in listings without holding its object, as if it
    /// was deleted between the listing and the download.
    pub fn insert_phantom_date(&self, date: DateKey) {
        self.inner
            .phantom_keys
            .lock()
            .unwrap()
            .insert(date.object_key());
    }

    /// Make every get/put for `date` fail with a permanent transfer error.
    pub fn fail_date(&self, date: DateKey) {
        self.inner
            .failing_keys
            .lock()
            .unwrap()
            .insert(date.object_key());
    }

    /// Make every listing fail with a permanent transfer error.
    pub fn fail_listing(&self) {
        self.inner.fail_listing.store(true, Ordering::SeqCst);
    }

    pub fn network_calls(&self) -> usize {
        self.inner.network_calls.load(Ordering::SeqCst)
    }

    pub fn bytes_for(&self, date: DateKey) -> Option<Vec<u8>> {
        self.inner
            .objects
            .lock()
            .unwrap()
            .get(&date.object_key())
            .cloned()
    }

    pub fn contains_date(&self, date: DateKey) -> bool {
        self.inner
            .objects
            .lock()
            .unwrap()
            .contains_key(&date.object_key())
    }

    fn check_key(&self, key: &str) -> Result<(), AppError> {
        if self.inner.failing_keys.lock().unwrap().contains(key) {
            return Err(AppError::RemoteTransfer {
                message: format!("injected transfer failure for {}", key),
                transient: false,
            });
        }
        Ok(())
    }
}

impl ObjectStore for MemoryObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, AppError> {
        self.inner.network_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_listing.load(Ordering::SeqCst) {
            return Err(AppError::RemoteTransfer {
                message: "injected listing failure".to_string(),
                transient: false,
            });
        }
        let mut listed: Vec<ObjectMeta> = self
            .inner
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, data)| ObjectMeta {
                key: key.clone(),
                size: data.len() as u64,
            })
            .collect();
        listed.extend(
            self.inner
                .phantom_keys
                .lock()
                .unwrap()
                .iter()
                .filter(|key| key.starts_with(prefix))
                .map(|key| ObjectMeta {
                    key: key.clone(),
                    size: 0,
                }),
        );
        Ok(listed)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError> {
        self.inner.network_calls.fetch_add(1, Ordering::SeqCst);
        self.check_key(key)?;
        self.inner
            .objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::RemoteNotFound(key.to_string()))
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), AppError> {
        self.inner.network_calls.fetch_add(1, Ordering::SeqCst);
        self.check_key(key)?;
        self.insert(key, data);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.inner.network_calls.fetch_add(1, Ordering::SeqCst);
        self.check_key(key)?;
        self.inner.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        self.inner.network_calls.fetch_add(1, Ordering::SeqCst);
        self.check_key(key)?;
        Ok(self.inner.objects.lock().unwrap().contains_key(key))
    }
}

pub fn date(raw: &str) -> DateKey {
    raw.parse().unwrap()
}

pub fn entry(url: &str, title: &str) -> NewsEntry {
    let at = Utc.with_ymd_and_hms(2025, 12, 17, 8, 0, 0).unwrap();
    NewsEntry {
        url: url.to_string(),
        title: title.to_string(),
        source_id: "hackernews".to_string(),
        category: None,
        first_seen: at,
        last_seen: at,
    }
}

/// Write a daily SQLite file at `path` holding the given entries.
pub async fn build_daily_db(path: &Path, entries: &[NewsEntry]) {
    let mut file = DailyFile::create(path).await.unwrap();
    for item in entries {
        file.upsert_entry(item).await.unwrap();
    }
    file.close().await.unwrap();
}

/// Bytes of a daily SQLite file holding the given entries.
pub async fn daily_db_bytes(entries: &[NewsEntry]) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seed.db");
    build_daily_db(&path, entries).await;
    tokio::fs::read(&path).await.unwrap()
}

/// Read the entries of the daily SQLite file stored in `bytes`.
pub async fn entries_of_bytes(bytes: &[u8]) -> Vec<NewsEntry> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.db");
    tokio::fs::write(&path, bytes).await.unwrap();
    let mut file = DailyFile::open(&path).await.unwrap();
    let entries = file.entries().await.unwrap();
    file.close().await.unwrap();
    entries
}
