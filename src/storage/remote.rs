//! Remote daily-file store
//!
//! Date-keyed facade over an [`ObjectStore`]: every daily file lives at
//! `news/{date}.db` in the bucket. All network calls go through the
//! retry policy; objects under the prefix whose keys do not match the
//! convention are skipped with a warning.

use std::path::Path;

use tempfile::NamedTempFile;

use crate::date::{DateKey, REMOTE_PREFIX};
use crate::error::AppError;
use crate::storage::object_store::{ObjectMeta, ObjectStore};
use crate::storage::retry::{RetryPolicy, with_retry};

/// Remote store for daily news databases
pub struct RemoteNewsStore<S> {
    store: S,
    retry: RetryPolicy,
}

impl<S: ObjectStore> RemoteNewsStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(store: S, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// List all dates available remotely, ascending.
    ///
    /// # Errors
    /// Fails on transport or authorization errors; an empty bucket is an
    /// empty list, not an error.
    pub async fn list_dates(&self) -> Result<Vec<DateKey>, AppError> {
        let objects = with_retry(&self.retry, "list", || self.store.list(REMOTE_PREFIX)).await?;

        let mut dates = Vec::with_capacity(objects.len());
        for ObjectMeta { key, .. } in objects {
            match DateKey::from_object_key(&key) {
                Some(date) => dates.push(date),
                None => {
                    tracing::warn!(key = %key, "Skipping remote object with malformed key");
                }
            }
        }
        dates.sort_unstable();
        dates.dedup();
        Ok(dates)
    }

    /// Fetch the daily file for `date` as bytes.
    pub async fn fetch(&self, date: DateKey) -> Result<Vec<u8>, AppError> {
        let key = date.object_key();
        with_retry(&self.retry, "download", || self.store.get(&key)).await
    }

    /// Download the daily file for `date` into a private temp file in
    /// `dir`. Keeping the temp file on the same filesystem as its final
    /// destination makes the later rename atomic.
    pub async fn fetch_to_temp(&self, date: DateKey, dir: &Path) -> Result<NamedTempFile, AppError> {
        let bytes = self.fetch(date).await?;
        let mut file = tempfile::Builder::new()
            .prefix(".sync-")
            .suffix(".db.part")
            .tempfile_in(dir)?;
        std::io::Write::write_all(&mut file, &bytes)?;
        tracing::debug!(date = %date, size = bytes.len(), "Downloaded remote daily file");
        Ok(file)
    }

    /// Upload the local file at `path` as the daily file for `date`,
    /// replacing any existing object at that key.
    pub async fn upload(&self, date: DateKey, path: &Path) -> Result<(), AppError> {
        let bytes = tokio::fs::read(path).await?;
        let key = date.object_key();
        with_retry(&self.retry, "upload", || self.store.put(&key, bytes.clone())).await?;
        tracing::info!(date = %date, size = bytes.len(), "Uploaded daily file");
        Ok(())
    }

    /// Whether a daily file exists remotely for `date`.
    pub async fn exists(&self, date: DateKey) -> Result<bool, AppError> {
        let key = date.object_key();
        with_retry(&self.retry, "head", || self.store.exists(&key)).await
    }

    /// Remove the remote daily file for `date`.
    pub async fn delete(&self, date: DateKey) -> Result<(), AppError> {
        let key = date.object_key();
        with_retry(&self.retry, "delete", || self.store.delete(&key)).await
    }
}
