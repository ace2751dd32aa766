//! Daily data file records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tracked news item, unique per URL within a daily file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEntry {
    /// Content identifier; primary key of the daily file
    pub url: String,
    pub title: String,
    /// Feed/platform the item was collected from
    pub source_id: String,
    pub category: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// One rank observation; append-only time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankRecord {
    pub url: String,
    pub rank: i64,
    pub recorded_at: DateTime<Utc>,
}

/// One observed title change; append-only time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleChange {
    pub url: String,
    pub old_title: Option<String>,
    pub new_title: String,
    pub changed_at: DateTime<Utc>,
}
