//! Data layer
//!
//! Per-day SQLite data files and their records. The merge contract lives
//! in `daily`; the rest of the crate treats a daily file as an opaque
//! blob keyed by date.

mod daily;
mod models;

pub use daily::{DailyFile, MergeStats};
pub use models::{NewsEntry, RankRecord, TitleChange};
