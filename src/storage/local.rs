//! Local daily-file store
//!
//! Enumerates and maintains the per-day SQLite files in the local data
//! directory. Read paths never create or mutate anything; installs go
//! through an atomic temp-file rename so a crashed download can never
//! leave a half-written daily file in place.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::date::DateKey;
use crate::error::AppError;

/// Local store for daily news databases
pub struct LocalNewsStore {
    data_dir: PathBuf,
}

/// Aggregate over the local daily files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalStats {
    pub total_size_bytes: u64,
    pub date_count: usize,
    pub earliest: Option<DateKey>,
    pub latest: Option<DateKey>,
}

impl LocalNewsStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_for(&self, date: DateKey) -> PathBuf {
        self.data_dir.join(date.file_name())
    }

    pub fn contains(&self, date: DateKey) -> bool {
        self.path_for(date).is_file()
    }

    /// List all dates with a local daily file, ascending.
    ///
    /// Files that do not match the `{YYYY-MM-DD}.db` convention are
    /// ignored; a missing data directory yields an empty list.
    pub async fn list_dates(&self) -> Result<Vec<DateKey>, AppError> {
        let mut entries = match tokio::fs::read_dir(&self.data_dir).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };

        let mut dates = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(date) = DateKey::from_file_name(name) {
                if entry.file_type().await?.is_file() {
                    dates.push(date);
                }
            }
        }
        dates.sort_unstable();
        Ok(dates)
    }

    /// Aggregate size and date range; zero-valued on an empty or missing
    /// directory.
    pub async fn stats(&self) -> Result<LocalStats, AppError> {
        let dates = self.list_dates().await?;
        let mut total_size_bytes = 0_u64;
        for date in &dates {
            total_size_bytes += tokio::fs::metadata(self.path_for(*date)).await?.len();
        }
        Ok(LocalStats {
            total_size_bytes,
            date_count: dates.len(),
            earliest: dates.first().copied(),
            latest: dates.last().copied(),
        })
    }

    /// Create the data directory if missing. Called before downloads so
    /// temp files land on the destination filesystem.
    pub async fn ensure_dir(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        Ok(())
    }

    /// Atomically install a downloaded temp file as the daily file for
    /// `date`.
    pub async fn install(&self, date: DateKey, file: NamedTempFile) -> Result<PathBuf, AppError> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        let target = self.path_for(date);
        file.persist(&target).map_err(|e| AppError::LocalIo(e.error))?;
        Ok(target)
    }

    /// Delete local daily files dated strictly before `cutoff`.
    pub async fn prune_older_than(&self, cutoff: DateKey) -> Result<Vec<DateKey>, AppError> {
        let mut removed = Vec::new();
        for date in self.list_dates().await? {
            if date < cutoff {
                tokio::fs::remove_file(self.path_for(date)).await?;
                tracing::info!(date = %date, "Pruned expired local daily file");
                removed.push(date);
            }
        }
        Ok(removed)
    }
}
