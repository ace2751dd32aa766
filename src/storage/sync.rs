//! Pull/push synchronization engine
//!
//! Pull installs remote daily files that are missing locally; dates that
//! already exist locally are skipped untouched, since merge happens only
//! on the upload side and pulling can never overwrite local data. Push
//! merges the local file into the current remote copy before uploading,
//! so entries contributed by another writer for the same date are not
//! silently lost.

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::data::DailyFile;
use crate::date::DateKey;
use crate::error::AppError;
use crate::storage::local::LocalNewsStore;
use crate::storage::object_store::ObjectStore;
use crate::storage::remote::RemoteNewsStore;

/// Downloads in flight during one pull
const PULL_CONCURRENCY: usize = 4;

/// Outcome of one pull invocation
#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    pub success: bool,
    pub synced_dates: Vec<DateKey>,
    pub skipped_dates: Vec<DateKey>,
    pub failed_dates: Vec<FailedDate>,
    pub message: String,
}

/// One date that could not be pulled
#[derive(Debug, Clone, Serialize)]
pub struct FailedDate {
    pub date: DateKey,
    pub error: String,
}

impl SyncResult {
    pub(crate) fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            synced_dates: Vec::new(),
            skipped_dates: Vec::new(),
            failed_dates: Vec::new(),
            message: message.into(),
        }
    }
}

/// Outcome of one merge-on-upload push
#[derive(Debug, Clone, Serialize)]
pub struct PushReport {
    pub date: DateKey,
    /// Whether an existing remote file was merged before upload
    pub merged: bool,
    /// Entry count of the uploaded file
    pub entries: u64,
}

/// Orchestrates transfers between one local store and one remote store
pub struct SyncEngine<S> {
    remote: RemoteNewsStore<S>,
    local: LocalNewsStore,
}

impl<S: ObjectStore> SyncEngine<S> {
    pub fn new(remote: RemoteNewsStore<S>, local: LocalNewsStore) -> Self {
        Self { remote, local }
    }

    pub fn local(&self) -> &LocalNewsStore {
        &self.local
    }

    pub fn remote(&self) -> &RemoteNewsStore<S> {
        &self.remote
    }

    /// Pull the most recent `max_days` remote dates that are missing
    /// locally.
    ///
    /// Dates already present locally are skipped with their files
    /// untouched. Failure of one date never aborts the batch; the result
    /// reports all three groups in descending recency order regardless
    /// of download completion order. `success` is false only when the
    /// backend is unavailable as a whole.
    pub async fn pull(&self, max_days: usize) -> SyncResult {
        let remote_dates = match self.remote.list_dates().await {
            Ok(dates) => dates,
            Err(error) => {
                tracing::error!(error = %error, "Remote listing failed; aborting pull");
                return SyncResult::failure(format!("remote listing failed: {}", error));
            }
        };

        // Most recent first: newer data takes priority under day limits.
        let targets: Vec<DateKey> = remote_dates.iter().rev().take(max_days).copied().collect();

        let local_dates = match self.local.list_dates().await {
            Ok(dates) => dates,
            Err(error) => {
                return SyncResult::failure(format!("local listing failed: {}", error));
            }
        };

        let mut skipped_dates = Vec::new();
        let mut to_fetch = Vec::new();
        for date in &targets {
            if local_dates.binary_search(date).is_ok() {
                tracing::debug!(date = %date, "Local daily file exists, skipping");
                skipped_dates.push(*date);
            } else {
                to_fetch.push(*date);
            }
        }

        if !to_fetch.is_empty() {
            if let Err(error) = self.local.ensure_dir().await {
                return SyncResult::failure(format!("cannot create data directory: {}", error));
            }
        }

        let outcomes = stream::iter(to_fetch)
            .map(|date| async move { (date, self.install_remote(date).await) })
            .buffer_unordered(PULL_CONCURRENCY)
            .collect::<Vec<_>>()
            .await;

        let mut synced_dates = Vec::new();
        let mut failed_dates = Vec::new();
        for (date, outcome) in outcomes {
            match outcome {
                Ok(()) => synced_dates.push(date),
                Err(error) => {
                    tracing::warn!(date = %date, error = %error, "Pull failed for date");
                    failed_dates.push(FailedDate {
                        date,
                        error: error.to_string(),
                    });
                }
            }
        }

        synced_dates.sort_unstable_by(|a, b| b.cmp(a));
        failed_dates.sort_unstable_by(|a, b| b.date.cmp(&a.date));

        let message = format!(
            "synced {}, skipped {} (already local), failed {}",
            synced_dates.len(),
            skipped_dates.len(),
            failed_dates.len()
        );
        tracing::info!(
            synced = synced_dates.len(),
            skipped = skipped_dates.len(),
            failed = failed_dates.len(),
            "Pull completed"
        );

        SyncResult {
            success: true,
            synced_dates,
            skipped_dates,
            failed_dates,
            message,
        }
    }

    async fn install_remote(&self, date: DateKey) -> Result<(), AppError> {
        let temp = self.remote.fetch_to_temp(date, self.local.data_dir()).await?;
        self.local.install(date, temp).await?;
        tracing::info!(date = %date, "Installed remote daily file");
        Ok(())
    }

    /// Upload the local daily file for `date`, merging with any existing
    /// remote file first (merge-on-upload).
    ///
    /// The local side wins per URL; rank history and title changes from
    /// both sides are kept. When no remote file exists the local file is
    /// uploaded as-is.
    pub async fn push(&self, date: DateKey) -> Result<PushReport, AppError> {
        let local_path = self.local.path_for(date);
        if !local_path.is_file() {
            return Err(AppError::LocalIo(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no local daily file for {}", date),
            )));
        }

        match self.remote.fetch_to_temp(date, self.local.data_dir()).await {
            Ok(remote_temp) => {
                let mut merged = DailyFile::create(remote_temp.path()).await?;
                let stats = merged.merge_from(&local_path).await?;
                let entries = merged.entry_count().await?;
                merged.close().await?;

                tracing::info!(
                    date = %date,
                    upserted = stats.entries_upserted,
                    rank_rows = stats.rank_rows,
                    "Merged local entries into remote daily file"
                );

                self.remote.upload(date, remote_temp.path()).await?;
                Ok(PushReport {
                    date,
                    merged: true,
                    entries,
                })
            }
            Err(AppError::RemoteNotFound(_)) => {
                let mut local_file = DailyFile::open(&local_path).await?;
                let entries = local_file.entry_count().await?;
                local_file.close().await?;

                self.remote.upload(date, &local_path).await?;
                Ok(PushReport {
                    date,
                    merged: false,
                    entries,
                })
            }
            Err(error) => Err(error),
        }
    }

    /// Delete remote daily files dated strictly before
    /// `today - retention_days`; a retention of 0 disables enforcement.
    ///
    /// Runs out-of-band from pull/push.
    pub async fn enforce_remote_retention(
        &self,
        today: DateKey,
        retention_days: u32,
    ) -> Result<Vec<DateKey>, AppError> {
        if retention_days == 0 {
            return Ok(Vec::new());
        }

        let cutoff = today.minus_days(retention_days);
        let mut removed = Vec::new();
        for date in self.remote.list_dates().await? {
            if date < cutoff {
                self.remote.delete(date).await?;
                tracing::info!(date = %date, "Deleted expired remote daily file");
                removed.push(date);
            }
        }
        Ok(removed)
    }
}
