//! Storage status and date listing reports
//!
//! Read-only snapshots over the local directory and the remote listing,
//! computed on demand and never persisted. Remote failures surface as an
//! `error` field inside an otherwise successful report; they never
//! propagate to the caller. Credential material never appears in any
//! report.

use std::str::FromStr;

use serde::Serialize;

use crate::config::{AppConfig, RemoteConfigView};
use crate::date::DateKey;
use crate::error::AppError;
use crate::storage::local::{LocalNewsStore, LocalStats};
use crate::storage::object_store::{ObjectStore, S3ObjectStore};
use crate::storage::remote::RemoteNewsStore;

/// Combined local/remote storage status
#[derive(Debug, Clone, Serialize)]
pub struct StorageStatus {
    pub success: bool,
    pub backend: String,
    pub local: LocalStatusReport,
    pub remote: RemoteStatusReport,
    pub pull: PullSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocalStatusReport {
    pub data_dir: String,
    pub retention_days: u32,
    pub total_size_bytes: u64,
    pub date_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest_date: Option<DateKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_date: Option<DateKey>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoteStatusReport {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest_date: Option<DateKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_date: Option<DateKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PullSettings {
    pub enabled: bool,
    pub days: u32,
}

impl RemoteStatusReport {
    fn unconfigured() -> Self {
        Self {
            configured: false,
            endpoint_url: None,
            bucket_name: None,
            region: None,
            date_count: None,
            earliest_date: None,
            latest_date: None,
            error: None,
        }
    }

    fn configured_with_error(view: RemoteConfigView, error: String) -> Self {
        Self {
            configured: true,
            endpoint_url: Some(view.endpoint_url),
            bucket_name: Some(view.bucket_name),
            region: non_empty(view.region),
            date_count: None,
            earliest_date: None,
            latest_date: None,
            error: Some(error),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Build the full storage status report.
///
/// Never fails: local stats degrade to zero values on I/O errors and
/// remote listing errors are reported in `remote.error`. When the remote
/// is unconfigured the listing is skipped entirely, avoiding any network
/// call.
pub async fn storage_status(config: &AppConfig) -> StorageStatus {
    let remote_config = config.resolved_remote();
    let local_store = LocalNewsStore::new(&config.storage.local.data_dir);

    let remote = if !remote_config.is_configured() {
        RemoteStatusReport::unconfigured()
    } else {
        let view = remote_config.sanitized();
        match S3ObjectStore::new(&remote_config) {
            Ok(backend) => remote_report(view, &RemoteNewsStore::new(backend)).await,
            Err(error) => RemoteStatusReport::configured_with_error(view, error.to_string()),
        }
    };

    assemble_status(config, &local_store, remote).await
}

/// Same as [`storage_status`] against an explicit remote store; the
/// report marks the remote as configured.
pub async fn storage_status_with<S: ObjectStore>(
    config: &AppConfig,
    local_store: &LocalNewsStore,
    view: RemoteConfigView,
    remote_store: &RemoteNewsStore<S>,
) -> StorageStatus {
    let remote = remote_report(view, remote_store).await;
    assemble_status(config, local_store, remote).await
}

async fn remote_report<S: ObjectStore>(
    view: RemoteConfigView,
    remote_store: &RemoteNewsStore<S>,
) -> RemoteStatusReport {
    match remote_store.list_dates().await {
        Ok(dates) => RemoteStatusReport {
            configured: true,
            endpoint_url: Some(view.endpoint_url),
            bucket_name: Some(view.bucket_name),
            region: non_empty(view.region),
            date_count: Some(dates.len()),
            earliest_date: dates.first().copied(),
            latest_date: dates.last().copied(),
            error: None,
        },
        Err(error) => {
            tracing::warn!(error = %error, "Remote listing failed while building status report");
            RemoteStatusReport::configured_with_error(view, error.to_string())
        }
    }
}

async fn assemble_status(
    config: &AppConfig,
    local_store: &LocalNewsStore,
    remote: RemoteStatusReport,
) -> StorageStatus {
    let stats = match local_store.stats().await {
        Ok(stats) => stats,
        Err(error) => {
            tracing::warn!(error = %error, "Local stats failed while building status report");
            LocalStats::default()
        }
    };

    let backend = if remote.configured { "s3" } else { "local" };

    StorageStatus {
        success: true,
        backend: backend.to_string(),
        local: LocalStatusReport {
            data_dir: local_store.data_dir().display().to_string(),
            retention_days: config.resolved_local_retention_days(),
            total_size_bytes: stats.total_size_bytes,
            date_count: stats.date_count,
            earliest_date: stats.earliest,
            latest_date: stats.latest,
        },
        remote,
        pull: PullSettings {
            enabled: config.storage.pull.enabled,
            days: config.storage.pull.days,
        },
    }
}

/// Which side(s) a date listing covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSource {
    Local,
    Remote,
    Both,
}

impl FromStr for ListSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(ListSource::Local),
            "remote" => Ok(ListSource::Remote),
            "both" => Ok(ListSource::Both),
            other => Err(AppError::Config(format!(
                "unknown date source {:?} (expected local, remote or both)",
                other
            ))),
        }
    }
}

/// Date listing report
#[derive(Debug, Clone, Serialize)]
pub struct DateListing {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<Vec<DateKey>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<Vec<DateKey>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<DateComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Set differences between the local and remote date sets
#[derive(Debug, Clone, Serialize)]
pub struct DateComparison {
    pub only_local: Vec<DateKey>,
    pub only_remote: Vec<DateKey>,
    pub both: Vec<DateKey>,
}

/// Partition the union of two date sets into local-only, remote-only and
/// intersection, each ascending.
pub fn compare_date_sets(local: &[DateKey], remote: &[DateKey]) -> DateComparison {
    use std::collections::BTreeSet;

    let local: BTreeSet<DateKey> = local.iter().copied().collect();
    let remote: BTreeSet<DateKey> = remote.iter().copied().collect();

    DateComparison {
        only_local: local.difference(&remote).copied().collect(),
        only_remote: remote.difference(&local).copied().collect(),
        both: local.intersection(&remote).copied().collect(),
    }
}

/// List available dates from the requested source(s).
pub async fn list_available_dates(config: &AppConfig, source: ListSource) -> DateListing {
    let remote_config = config.resolved_remote();
    let local_store = LocalNewsStore::new(&config.storage.local.data_dir);

    if !remote_config.is_configured() {
        return list_available_dates_with::<S3ObjectStore>(source, &local_store, None).await;
    }

    match S3ObjectStore::new(&remote_config) {
        Ok(backend) => {
            let remote_store = RemoteNewsStore::new(backend);
            list_available_dates_with(source, &local_store, Some(&remote_store)).await
        }
        Err(error) => {
            let mut listing =
                list_available_dates_with::<S3ObjectStore>(source, &local_store, None).await;
            if matches!(source, ListSource::Remote | ListSource::Both) {
                listing.error = Some(error.to_string());
            }
            listing
        }
    }
}

/// Core of [`list_available_dates`], generic over the backend. A `None`
/// remote store reports "not configured" when a remote listing was
/// requested.
pub async fn list_available_dates_with<S: ObjectStore>(
    source: ListSource,
    local_store: &LocalNewsStore,
    remote_store: Option<&RemoteNewsStore<S>>,
) -> DateListing {
    let mut listing = DateListing {
        success: true,
        local: None,
        remote: None,
        comparison: None,
        error: None,
    };

    if matches!(source, ListSource::Local | ListSource::Both) {
        match local_store.list_dates().await {
            Ok(dates) => listing.local = Some(dates),
            Err(error) => {
                listing.success = false;
                listing.error = Some(format!("local listing failed: {}", error));
                return listing;
            }
        }
    }

    if matches!(source, ListSource::Remote | ListSource::Both) {
        match remote_store {
            None => listing.error = Some("remote storage is not configured".to_string()),
            Some(store) => match store.list_dates().await {
                Ok(dates) => listing.remote = Some(dates),
                Err(error) => {
                    tracing::warn!(error = %error, "Remote listing failed");
                    listing.error = Some(format!("remote listing failed: {}", error));
                }
            },
        }
    }

    if source == ListSource::Both {
        if let (Some(local), Some(remote)) = (&listing.local, &listing.remote) {
            listing.comparison = Some(compare_date_sets(local, remote));
        }
    }

    listing
}

#[cfg(test)]
mod tests {
    use super::{ListSource, compare_date_sets};
    use crate::date::DateKey;

    fn dates(raw: &[&str]) -> Vec<DateKey> {
        raw.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn comparison_partitions_the_union() {
        let local = dates(&["2025-12-14", "2025-12-15", "2025-12-16"]);
        let remote = dates(&["2025-12-15", "2025-12-16", "2025-12-17"]);

        let comparison = compare_date_sets(&local, &remote);
        assert_eq!(comparison.only_local, dates(&["2025-12-14"]));
        assert_eq!(comparison.only_remote, dates(&["2025-12-17"]));
        assert_eq!(comparison.both, dates(&["2025-12-15", "2025-12-16"]));
    }

    #[test]
    fn comparison_of_disjoint_sets() {
        let local = dates(&["2025-12-14"]);
        let remote = dates(&["2025-12-17"]);

        let comparison = compare_date_sets(&local, &remote);
        assert_eq!(comparison.only_local, local);
        assert_eq!(comparison.only_remote, remote);
        assert!(comparison.both.is_empty());
    }

    #[test]
    fn comparison_with_empty_sides() {
        let comparison = compare_date_sets(&[], &[]);
        assert!(comparison.only_local.is_empty());
        assert!(comparison.only_remote.is_empty());
        assert!(comparison.both.is_empty());
    }

    #[test]
    fn list_source_parses_case_insensitively() {
        assert_eq!("local".parse::<ListSource>().unwrap(), ListSource::Local);
        assert_eq!("Remote".parse::<ListSource>().unwrap(), ListSource::Remote);
        assert_eq!("BOTH".parse::<ListSource>().unwrap(), ListSource::Both);
        assert!("everything".parse::<ListSource>().is_err());
    }
}
