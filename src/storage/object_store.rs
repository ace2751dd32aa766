//! Object storage backend
//!
//! `ObjectStore` is the capability seam over the S3-compatible protocol:
//! upload, download, list, delete and existence checks by raw key. The
//! sync engine and the status service are generic over it, so tests can
//! substitute an in-memory implementation.

use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;

use crate::config::RemoteConfig;
use crate::error::AppError;

/// Metadata for one stored object
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
}

/// Capability over an S3-compatible object store
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    /// List all objects under a key prefix. An empty bucket yields an
    /// empty result, not an error.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, AppError>;

    /// Fetch an object's bytes. Fails with `RemoteNotFound` if the key
    /// does not exist.
    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError>;

    /// Store bytes at a key, replacing any existing object.
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), AppError>;

    /// Remove the object at a key.
    async fn delete(&self, key: &str) -> Result<(), AppError>;

    /// Whether an object exists at the key.
    async fn exists(&self, key: &str) -> Result<bool, AppError>;
}

/// S3-compatible backend
///
/// Construction validates the endpoint locally and never performs a
/// network round-trip; transport failures only surface on the first
/// operation.
#[derive(Debug)]
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a client from a resolved remote configuration
    ///
    /// # Errors
    /// `ConfigIncomplete` when required credential fields are missing,
    /// `BackendUnavailable` when the endpoint URL is malformed.
    pub fn new(config: &RemoteConfig) -> Result<Self, AppError> {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        if !config.is_configured() {
            return Err(AppError::ConfigIncomplete(
                config.missing_fields().join(", "),
            ));
        }

        let endpoint = url::Url::parse(&config.endpoint_url)
            .map_err(|e| AppError::BackendUnavailable(format!("invalid endpoint URL: {}", e)))?;

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "newsvault-remote",
        );

        let region = if config.region.is_empty() {
            "auto".to_string()
        } else {
            config.region.clone()
        };

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .http_client(crate::storage::build_http_client())
            .region(Region::new(region))
            .endpoint_url(endpoint.as_str())
            .credentials_provider(credentials)
            .build();

        Ok(Self {
            client: S3Client::from_conf(s3_config),
            bucket: config.bucket_name.clone(),
        })
    }
}

/// Service error codes worth retrying
const TRANSIENT_SERVICE_CODES: &[&str] = &[
    "InternalError",
    "SlowDown",
    "ServiceUnavailable",
    "RequestTimeout",
];

fn classify_sdk_error<E, R>(context: String, error: &SdkError<E, R>) -> AppError
where
    E: ProvideErrorMetadata,
{
    let transient = match error {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) | SdkError::ResponseError(_) => {
            true
        }
        SdkError::ServiceError(_) => error
            .code()
            .is_some_and(|code| TRANSIENT_SERVICE_CODES.contains(&code)),
        _ => false,
    };
    AppError::transfer(format!("{}: {}", context, error), transient)
}

impl ObjectStore for S3ObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, AppError> {
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);
            if let Some(token) = &continuation {
                request = request.continuation_token(token.as_str());
            }

            let page = request
                .send()
                .await
                .map_err(|e| classify_sdk_error("listing remote objects failed".to_string(), &e))?;

            for object in page.contents() {
                if let (Some(key), Some(size)) = (object.key(), object.size()) {
                    objects.push(ObjectMeta {
                        key: key.to_string(),
                        size: size.max(0) as u64,
                    });
                }
            }

            match page.next_continuation_token() {
                Some(token) if page.is_truncated() == Some(true) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(objects)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|error| {
                if error
                    .as_service_error()
                    .is_some_and(|service| service.is_no_such_key())
                {
                    AppError::RemoteNotFound(key.to_string())
                } else {
                    classify_sdk_error(format!("download of {} failed", key), &error)
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| AppError::transfer(format!("reading body of {} failed: {}", key, e), true))?;

        Ok(data.into_bytes().to_vec())
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type("application/x-sqlite3")
            .send()
            .await
            .map_err(|e| classify_sdk_error(format!("upload of {} failed", key), &e))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify_sdk_error(format!("delete of {} failed", key), &e))?;

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(error) => {
                if error
                    .as_service_error()
                    .is_some_and(|service| service.is_not_found())
                {
                    Ok(false)
                } else {
                    Err(classify_sdk_error(
                        format!("existence check for {} failed", key),
                        &error,
                    ))
                }
            }
        }
    }
}
