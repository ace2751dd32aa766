//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (NEWSVAULT_* override)
//!
//! The remote storage section additionally honors the `S3_*` environment
//! variables. Those are applied by [`AppConfig::resolved_remote`] on every
//! access, never cached, so rotated credentials take effect on the next
//! call without a restart.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::AppError;

/// Environment overrides for the remote section, field by field
const ENV_ENDPOINT_URL: &str = "S3_ENDPOINT_URL";
const ENV_BUCKET_NAME: &str = "S3_BUCKET_NAME";
const ENV_ACCESS_KEY_ID: &str = "S3_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "S3_SECRET_ACCESS_KEY";
const ENV_REGION: &str = "S3_REGION";
const ENV_REMOTE_RETENTION_DAYS: &str = "REMOTE_RETENTION_DAYS";
const ENV_LOCAL_RETENTION_DAYS: &str = "STORAGE_RETENTION_DAYS";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub local: LocalStorageConfig,
    #[serde(default)]
    pub remote: RemoteStorageConfig,
    #[serde(default)]
    pub pull: PullConfig,
}

/// Local daily-file directory configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LocalStorageConfig {
    /// Directory holding one SQLite file per day
    pub data_dir: PathBuf,
    /// Days of local daily files to keep (0 = keep forever)
    #[serde(default)]
    pub retention_days: u32,
}

/// Remote storage configuration as written in the config file.
///
/// Use [`AppConfig::resolved_remote`] to obtain the effective values;
/// this struct alone does not reflect environment overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteStorageConfig {
    #[serde(default)]
    pub endpoint_url: String,
    #[serde(default)]
    pub bucket_name: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub region: String,
    /// Days of remote daily files to keep (0 = keep forever)
    #[serde(default)]
    pub retention_days: u32,
}

/// Pull configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PullConfig {
    /// Run a pull on startup
    #[serde(default)]
    pub enabled: bool,
    /// How many recent remote dates a pull considers
    #[serde(default = "default_pull_days")]
    pub days: u32,
}

impl Default for PullConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            days: default_pull_days(),
        }
    }
}

fn default_pull_days() -> u32 {
    7
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

/// Effective remote configuration after environment overrides
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub endpoint_url: String,
    pub bucket_name: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub retention_days: u32,
}

/// Redacted remote configuration, safe for reports and logs.
///
/// Credentials are dropped entirely; the endpoint keeps its scheme only.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteConfigView {
    pub endpoint_url: String,
    pub bucket_name: String,
    pub region: String,
}

impl RemoteConfig {
    /// True iff all four required credential fields are non-empty.
    ///
    /// Callers must check this before any remote operation and
    /// short-circuit with a "not configured" result instead of
    /// attempting a connection.
    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Names of the required fields that are still empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.endpoint_url.is_empty() {
            missing.push("endpoint_url");
        }
        if self.bucket_name.is_empty() {
            missing.push("bucket_name");
        }
        if self.access_key_id.is_empty() {
            missing.push("access_key_id");
        }
        if self.secret_access_key.is_empty() {
            missing.push("secret_access_key");
        }
        missing
    }

    /// Redacted view for external-facing reports.
    pub fn sanitized(&self) -> RemoteConfigView {
        let endpoint_url = match url::Url::parse(&self.endpoint_url) {
            Ok(parsed) => format!("{}://***", parsed.scheme()),
            Err(_) => "***".to_string(),
        };
        RemoteConfigView {
            endpoint_url,
            bucket_name: self.bucket_name.clone(),
            region: self.region.clone(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (NEWSVAULT_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("storage.local.data_dir", "data/news")?
            .set_default("storage.local.retention_days", 0)?
            .set_default("storage.remote.region", "auto")?
            .set_default("storage.remote.retention_days", 0)?
            .set_default("storage.pull.enabled", false)?
            .set_default("storage.pull.days", 7)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("NEWSVAULT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.storage.local.data_dir.as_os_str().is_empty() {
            return Err(AppError::Config(
                "storage.local.data_dir must not be empty".to_string(),
            ));
        }
        if self.storage.pull.days == 0 {
            return Err(AppError::Config(
                "storage.pull.days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective remote configuration, environment winning over file values.
    ///
    /// Recomputed on each call; nothing is cached.
    pub fn resolved_remote(&self) -> RemoteConfig {
        self.resolved_remote_with(env_lookup)
    }

    /// Same as [`resolved_remote`](Self::resolved_remote) with an explicit
    /// environment, keeping the resolution a pure function of
    /// (config, environment).
    pub fn resolved_remote_with(&self, lookup: impl Fn(&str) -> Option<String>) -> RemoteConfig {
        let remote = &self.storage.remote;
        RemoteConfig {
            endpoint_url: override_field(&remote.endpoint_url, lookup(ENV_ENDPOINT_URL)),
            bucket_name: override_field(&remote.bucket_name, lookup(ENV_BUCKET_NAME)),
            access_key_id: override_field(&remote.access_key_id, lookup(ENV_ACCESS_KEY_ID)),
            secret_access_key: override_field(
                &remote.secret_access_key,
                lookup(ENV_SECRET_ACCESS_KEY),
            ),
            region: override_field(&remote.region, lookup(ENV_REGION)),
            retention_days: override_days(
                remote.retention_days,
                ENV_REMOTE_RETENTION_DAYS,
                lookup(ENV_REMOTE_RETENTION_DAYS),
            ),
        }
    }

    /// Effective local retention, honoring the environment override.
    pub fn resolved_local_retention_days(&self) -> u32 {
        override_days(
            self.storage.local.retention_days,
            ENV_LOCAL_RETENTION_DAYS,
            env_lookup(ENV_LOCAL_RETENTION_DAYS),
        )
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Environment wins when set and non-empty; otherwise the file value stands.
fn override_field(file_value: &str, env_value: Option<String>) -> String {
    match env_value {
        Some(value) if !value.trim().is_empty() => value,
        _ => file_value.to_string(),
    }
}

fn override_days(file_value: u32, env_name: &str, env_value: Option<String>) -> u32 {
    match env_value {
        Some(raw) if !raw.trim().is_empty() => match raw.trim().parse() {
            Ok(days) => days,
            Err(_) => {
                tracing::warn!(
                    env = %env_name,
                    value = %raw,
                    "Retention override is not a valid integer; keeping configured value"
                );
                file_value
            }
        },
        _ => file_value,
    }
}
