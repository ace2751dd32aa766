//! NewsVault binary entry point
//!
//! One-shot driver: reports storage status, runs a pull when enabled,
//! then enforces retention out-of-band. Command dispatch and argument
//! parsing belong to the calling tool layer; this binary only wires the
//! library operations together.

use newsvault::{config, service};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize tracing/logging
    let log_format =
        std::env::var("NEWSVAULT__LOGGING__FORMAT").unwrap_or_else(|_| "pretty".to_string());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "newsvault=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "newsvault=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!("Starting NewsVault...");

    // 2. Load configuration
    let config = config::AppConfig::load()?;
    tracing::info!(
        data_dir = %config.storage.local.data_dir.display(),
        pull_enabled = config.storage.pull.enabled,
        "Configuration loaded"
    );

    // 3. Report storage status
    let status = service::status::storage_status(&config).await;
    tracing::info!(status = %serde_json::to_string(&status)?, "Storage status");

    // 4. Pull recent remote dates
    if config.storage.pull.enabled {
        let result =
            service::sync::pull_from_remote(&config, config.storage.pull.days as usize).await;
        if !result.success {
            tracing::error!(message = %result.message, "Pull failed");
            std::process::exit(1);
        }
        tracing::info!(message = %result.message, "Pull finished");
    }

    // 5. Enforce retention out-of-band
    match service::sync::enforce_remote_retention(&config).await {
        Ok(removed) if !removed.is_empty() => {
            tracing::info!(removed = removed.len(), "Remote retention enforced");
        }
        Ok(_) => {}
        Err(error) => tracing::warn!(error = %error, "Remote retention enforcement failed"),
    }
    match service::sync::enforce_local_retention(&config).await {
        Ok(removed) if !removed.is_empty() => {
            tracing::info!(removed = removed.len(), "Local retention enforced");
        }
        Ok(_) => {}
        Err(error) => tracing::warn!(error = %error, "Local retention enforcement failed"),
    }

    Ok(())
}
