use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use utoipa::ToSchema;

use crate::services::error::TransferError;

/// Upper bound on the lifetime of an upload URL.
pub const MAX_PUT_EXPIRY: Duration = Duration::from_secs(120);
/// Upper bound on the lifetime of a download URL.
pub const MAX_GET_EXPIRY: Duration = Duration::from_secs(300);

pub const CSV_CONTENT_TYPE: &str = "text/csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
}

impl HttpMethod {
    fn max_expiry(self) -> Duration {
        match self {
            HttpMethod::Get => MAX_GET_EXPIRY,
            HttpMethod::Put => MAX_PUT_EXPIRY,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Put => f.write_str("PUT"),
        }
    }
}

/// A credential-bearing URL that authorizes exactly one method against one
/// object key until `expires_at`. It cannot be renewed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PresignedUrl {
    pub url: String,
    pub method: HttpMethod,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PresignedUrl {
    pub fn is_usable_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.issued_at && at < self.expires_at
    }

    /// The URL without its signed query, safe for logs and error messages.
    pub fn redacted(&self) -> &str {
        strip_query(&self.url)
    }
}

/// Drops everything from the first `?`, where presigned credentials live.
pub fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// Source of "now" for signing and expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant. Used to replay signing deterministically.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[async_trait]
pub trait UrlIssuer: Send + Sync {
    async fn issue_put(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<PresignedUrl, TransferError>;

    /// The resulting URL makes storage answer with a CSV content type and an
    /// inline disposition named after the entity.
    async fn issue_get(
        &self,
        bucket: &str,
        key: &str,
        entity: &str,
        expires_in: Duration,
    ) -> Result<PresignedUrl, TransferError>;
}

/// "meal" -> "Meal". Only the first character changes.
pub fn capitalize_entity(entity: &str) -> String {
    let mut chars = entity.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn csv_content_disposition(entity: &str) -> String {
    format!("inline; filename={}.csv", capitalize_entity(entity))
}

pub struct S3UrlIssuer {
    client: Client,
    clock: Arc<dyn Clock>,
}

impl S3UrlIssuer {
    pub fn new(client: Client) -> Self {
        Self::with_clock(client, Arc::new(SystemClock))
    }

    pub fn with_clock(client: Client, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }

    /// Validates the window and builds the signing config anchored at the
    /// clock's current second.
    fn presigning_window(
        &self,
        method: HttpMethod,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<(PresigningConfig, DateTime<Utc>, DateTime<Utc>), TransferError> {
        let max = method.max_expiry();
        if expires_in.is_zero() || expires_in > max {
            return Err(TransferError::InvalidExpiry {
                method,
                requested: expires_in,
                max,
            });
        }

        // SigV4 timestamps have second precision.
        let issued_at = self.clock.now().trunc_subsecs(0);
        let expires_in = Duration::from_secs(expires_in.as_secs());
        let expires_at = issued_at + chrono::Duration::seconds(expires_in.as_secs() as i64);

        let config = PresigningConfig::builder()
            .start_time(SystemTime::from(issued_at))
            .expires_in(expires_in)
            .build()
            .map_err(|e| signing_error(method, bucket, key, e))?;

        Ok((config, issued_at, expires_at))
    }
}

fn signing_error(
    method: HttpMethod,
    bucket: &str,
    key: &str,
    err: impl fmt::Display,
) -> TransferError {
    tracing::error!(
        "Failed to sign {} URL for {}/{}: {}",
        method,
        bucket,
        key,
        err
    );
    TransferError::Signing {
        method,
        bucket: bucket.to_string(),
        key: key.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl UrlIssuer for S3UrlIssuer {
    async fn issue_put(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<PresignedUrl, TransferError> {
        let (config, issued_at, expires_at) =
            self.presigning_window(HttpMethod::Put, bucket, key, expires_in)?;

        let request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| signing_error(HttpMethod::Put, bucket, key, e))?;

        tracing::debug!("Issued PUT URL for {}/{} until {}", bucket, key, expires_at);

        Ok(PresignedUrl {
            url: request.uri().to_string(),
            method: HttpMethod::Put,
            issued_at,
            expires_at,
        })
    }

    async fn issue_get(
        &self,
        bucket: &str,
        key: &str,
        entity: &str,
        expires_in: Duration,
    ) -> Result<PresignedUrl, TransferError> {
        let (config, issued_at, expires_at) =
            self.presigning_window(HttpMethod::Get, bucket, key, expires_in)?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .response_content_type(CSV_CONTENT_TYPE)
            .response_content_disposition(csv_content_disposition(entity))
            .presigned(config)
            .await
            .map_err(|e| signing_error(HttpMethod::Get, bucket, key, e))?;

        tracing::debug!("Issued GET URL for {}/{} until {}", bucket, key, expires_at);

        Ok(PresignedUrl {
            url: request.uri().to_string(),
            method: HttpMethod::Get,
            issued_at,
            expires_at,
        })
    }
}
