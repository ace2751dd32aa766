//! Sync operation entry points
//!
//! Thin wrappers that gate on the resolved remote configuration before
//! constructing the S3 backend, so an unconfigured deployment never
//! issues a network call.

use crate::config::AppConfig;
use crate::date::DateKey;
use crate::error::AppError;
use crate::storage::local::LocalNewsStore;
use crate::storage::object_store::S3ObjectStore;
use crate::storage::remote::RemoteNewsStore;
use crate::storage::sync::{PushReport, SyncEngine, SyncResult};

/// Pull the most recent `days` remote dates into the local store.
///
/// Returns a structured failure without contacting the network when the
/// remote credentials are incomplete.
pub async fn pull_from_remote(config: &AppConfig, days: usize) -> SyncResult {
    let remote_config = config.resolved_remote();
    if !remote_config.is_configured() {
        let missing = remote_config.missing_fields().join(", ");
        tracing::warn!(missing = %missing, "Pull requested but remote storage is not configured");
        return SyncResult::failure(format!(
            "remote storage is not configured: missing {}",
            missing
        ));
    }

    let engine = match build_engine(config, &remote_config) {
        Ok(engine) => engine,
        Err(error) => return SyncResult::failure(error.to_string()),
    };
    engine.pull(days).await
}

/// Merge-on-upload push of one local daily file, for the ingestion
/// pipeline.
pub async fn push_to_remote(config: &AppConfig, date: DateKey) -> Result<PushReport, AppError> {
    let remote_config = config.resolved_remote();
    if !remote_config.is_configured() {
        return Err(AppError::ConfigIncomplete(
            remote_config.missing_fields().join(", "),
        ));
    }

    build_engine(config, &remote_config)?.push(date).await
}

/// Delete remote daily files older than the configured retention.
///
/// A no-op when the remote is unconfigured or retention is 0.
pub async fn enforce_remote_retention(config: &AppConfig) -> Result<Vec<DateKey>, AppError> {
    let remote_config = config.resolved_remote();
    if !remote_config.is_configured() || remote_config.retention_days == 0 {
        return Ok(Vec::new());
    }

    let retention_days = remote_config.retention_days;
    build_engine(config, &remote_config)?
        .enforce_remote_retention(DateKey::today_utc(), retention_days)
        .await
}

/// Delete local daily files older than the configured retention.
pub async fn enforce_local_retention(config: &AppConfig) -> Result<Vec<DateKey>, AppError> {
    let retention_days = config.resolved_local_retention_days();
    if retention_days == 0 {
        return Ok(Vec::new());
    }

    let store = LocalNewsStore::new(&config.storage.local.data_dir);
    store
        .prune_older_than(DateKey::today_utc().minus_days(retention_days))
        .await
}

fn build_engine(
    config: &AppConfig,
    remote_config: &crate::config::RemoteConfig,
) -> Result<SyncEngine<S3ObjectStore>, AppError> {
    let backend = S3ObjectStore::new(remote_config)?;
    Ok(SyncEngine::new(
        RemoteNewsStore::new(backend),
        LocalNewsStore::new(&config.storage.local.data_dir),
    ))
}
