//! Calendar date keys
//!
//! A `DateKey` identifies one daily data file both locally (`{date}.db`
//! in the data directory) and remotely (`news/{date}.db` in the bucket).
//! The rendered form is strict ISO `YYYY-MM-DD`, so lexicographic order
//! of keys equals chronological order.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key prefix for daily files in the remote bucket
pub const REMOTE_PREFIX: &str = "news/";

/// File extension of daily files, local and remote
pub const FILE_SUFFIX: &str = ".db";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A calendar date identifying one daily data file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(NaiveDate);

/// Rejected date key input
#[derive(Debug, Error)]
#[error("invalid date key {0:?} (expected YYYY-MM-DD)")]
pub struct ParseDateKeyError(String);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Today's date in UTC
    pub fn today_utc() -> Self {
        Self(chrono::Utc::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Remote object key: `news/{date}.db`
    pub fn object_key(&self) -> String {
        format!("{}{}{}", REMOTE_PREFIX, self.0.format(DATE_FORMAT), FILE_SUFFIX)
    }

    /// Local file name: `{date}.db`
    pub fn file_name(&self) -> String {
        format!("{}{}", self.0.format(DATE_FORMAT), FILE_SUFFIX)
    }

    /// Inverse of [`object_key`](Self::object_key); `None` for any key
    /// that does not match the convention exactly.
    pub fn from_object_key(key: &str) -> Option<Self> {
        Self::from_file_name(key.strip_prefix(REMOTE_PREFIX)?)
    }

    /// Inverse of [`file_name`](Self::file_name).
    pub fn from_file_name(name: &str) -> Option<Self> {
        name.strip_suffix(FILE_SUFFIX)?.parse().ok()
    }

    pub fn minus_days(&self, days: u32) -> Self {
        Self(self.0 - chrono::Duration::days(i64::from(days)))
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = ParseDateKeyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // chrono is lenient about zero padding; require the canonical
        // 10-character form so key derivation stays bijective.
        if s.len() != 10 {
            return Err(ParseDateKeyError(s.to_string()));
        }
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(DateKey)
            .map_err(|_| ParseDateKeyError(s.to_string()))
    }
}
