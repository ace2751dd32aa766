//! Per-day SQLite data files
//!
//! One file per calendar date. News entries are unique by URL; rank
//! history and title changes are append-only time series. `merge_from`
//! implements the upload-side reconciliation: entries from the incoming
//! file win on URL conflicts, time-series rows are appended as-is.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sqlx::{Connection, Row, SqliteConnection};

use super::models::{NewsEntry, RankRecord, TitleChange};
use crate::error::AppError;

const CREATE_ENTRIES: &str = "CREATE TABLE IF NOT EXISTS news_entries (
    url TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    source_id TEXT NOT NULL,
    category TEXT,
    first_seen TEXT NOT NULL,
    last_seen TEXT NOT NULL
)";

const CREATE_RANK_HISTORY: &str = "CREATE TABLE IF NOT EXISTS rank_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    rank INTEGER NOT NULL,
    recorded_at TEXT NOT NULL
)";

const CREATE_TITLE_CHANGES: &str = "CREATE TABLE IF NOT EXISTS title_changes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    old_title TEXT,
    new_title TEXT NOT NULL,
    changed_at TEXT NOT NULL
)";

const UPSERT_ENTRY: &str = "INSERT INTO news_entries \
    (url, title, source_id, category, first_seen, last_seen) \
    VALUES (?, ?, ?, ?, ?, ?) \
    ON CONFLICT(url) DO UPDATE SET \
    title = excluded.title, \
    source_id = excluded.source_id, \
    category = excluded.category, \
    first_seen = excluded.first_seen, \
    last_seen = excluded.last_seen";

/// Row counts of one merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub entries_upserted: u64,
    pub rank_rows: u64,
    pub title_change_rows: u64,
}

/// An open daily data file
pub struct DailyFile {
    conn: SqliteConnection,
    path: PathBuf,
}

impl DailyFile {
    /// Open an existing daily file.
    pub async fn open(path: &Path) -> Result<Self, AppError> {
        Self::connect(path, "rw").await
    }

    /// Open a daily file, creating it and its schema if missing.
    pub async fn create(path: &Path) -> Result<Self, AppError> {
        let mut file = Self::connect(path, "rwc").await?;
        file.ensure_schema().await?;
        Ok(file)
    }

    async fn connect(path: &Path, mode: &str) -> Result<Self, AppError> {
        let connection_string = format!("sqlite:{}?mode={}", path.display(), mode);
        let conn = SqliteConnection::connect(&connection_string).await?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close the underlying connection.
    pub async fn close(self) -> Result<(), AppError> {
        self.conn.close().await?;
        Ok(())
    }

    async fn ensure_schema(&mut self) -> Result<(), AppError> {
        for statement in [CREATE_ENTRIES, CREATE_RANK_HISTORY, CREATE_TITLE_CHANGES] {
            sqlx::query(statement).execute(&mut self.conn).await?;
        }
        Ok(())
    }

    /// Insert or replace the entry for its URL.
    pub async fn upsert_entry(&mut self, entry: &NewsEntry) -> Result<(), AppError> {
        sqlx::query(UPSERT_ENTRY)
            .bind(&entry.url)
            .bind(&entry.title)
            .bind(&entry.source_id)
            .bind(&entry.category)
            .bind(entry.first_seen.to_rfc3339())
            .bind(entry.last_seen.to_rfc3339())
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    pub async fn append_rank(&mut self, record: &RankRecord) -> Result<(), AppError> {
        sqlx::query("INSERT INTO rank_history (url, rank, recorded_at) VALUES (?, ?, ?)")
            .bind(&record.url)
            .bind(record.rank)
            .bind(record.recorded_at.to_rfc3339())
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    pub async fn append_title_change(&mut self, change: &TitleChange) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO title_changes (url, old_title, new_title, changed_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&change.url)
        .bind(&change.old_title)
        .bind(&change.new_title)
        .bind(change.changed_at.to_rfc3339())
        .execute(&mut self.conn)
        .await?;
        Ok(())
    }

    /// All entries, ordered by URL.
    pub async fn entries(&mut self) -> Result<Vec<NewsEntry>, AppError> {
        let rows = sqlx::query(
            "SELECT url, title, source_id, category, first_seen, last_seen \
             FROM news_entries ORDER BY url",
        )
        .fetch_all(&mut self.conn)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(NewsEntry {
                    url: row.get("url"),
                    title: row.get("title"),
                    source_id: row.get("source_id"),
                    category: row.get("category"),
                    first_seen: parse_timestamp(&row.get::<String, _>("first_seen"))?,
                    last_seen: parse_timestamp(&row.get::<String, _>("last_seen"))?,
                })
            })
            .collect()
    }

    pub async fn entry_count(&mut self) -> Result<u64, AppError> {
        self.count("SELECT COUNT(*) FROM news_entries").await
    }

    pub async fn rank_count(&mut self) -> Result<u64, AppError> {
        self.count("SELECT COUNT(*) FROM rank_history").await
    }

    pub async fn title_change_count(&mut self) -> Result<u64, AppError> {
        self.count("SELECT COUNT(*) FROM title_changes").await
    }

    async fn count(&mut self, statement: &str) -> Result<u64, AppError> {
        let row = sqlx::query(statement).fetch_one(&mut self.conn).await?;
        Ok(row.get::<i64, _>(0).max(0) as u64)
    }

    /// Merge another daily file into this one.
    ///
    /// Entries are upserted by URL with the incoming side winning on
    /// conflict; rank history and title changes are appended without
    /// deduplication. Merging the same incoming file twice leaves
    /// `news_entries` identical to merging it once.
    pub async fn merge_from(&mut self, incoming: &Path) -> Result<MergeStats, AppError> {
        let escaped_path = incoming.display().to_string().replace('\'', "''");
        sqlx::query(&format!("ATTACH DATABASE '{}' AS incoming", escaped_path))
            .execute(&mut self.conn)
            .await?;

        let merged = self.merge_attached().await;

        // Always detach, even when the merge itself failed
        let detached = sqlx::query("DETACH DATABASE incoming")
            .execute(&mut self.conn)
            .await;

        let stats = merged?;
        detached?;
        Ok(stats)
    }

    async fn merge_attached(&mut self) -> Result<MergeStats, AppError> {
        let entries_upserted = sqlx::query(
            "INSERT INTO news_entries \
             (url, title, source_id, category, first_seen, last_seen) \
             SELECT url, title, source_id, category, first_seen, last_seen \
             FROM incoming.news_entries WHERE true \
             ON CONFLICT(url) DO UPDATE SET \
             title = excluded.title, \
             source_id = excluded.source_id, \
             category = excluded.category, \
             first_seen = excluded.first_seen, \
             last_seen = excluded.last_seen",
        )
        .execute(&mut self.conn)
        .await?
        .rows_affected();

        let rank_rows = sqlx::query(
            "INSERT INTO rank_history (url, rank, recorded_at) \
             SELECT url, rank, recorded_at FROM incoming.rank_history",
        )
        .execute(&mut self.conn)
        .await?
        .rows_affected();

        let title_change_rows = sqlx::query(
            "INSERT INTO title_changes (url, old_title, new_title, changed_at) \
             SELECT url, old_title, new_title, changed_at FROM incoming.title_changes",
        )
        .execute(&mut self.conn)
        .await?
        .rows_affected();

        Ok(MergeStats {
            entries_upserted,
            rank_rows,
            title_change_rows,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| {
            AppError::Internal(anyhow::anyhow!(
                "invalid timestamp {:?} in daily file: {}",
                raw,
                error
            ))
        })
}
