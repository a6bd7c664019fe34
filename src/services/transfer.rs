use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

use crate::entities::EntityKind;
use crate::services::csv_codec::{self, CsvEncoder};
use crate::services::error::TransferError;
use crate::services::fetcher::{PageFetcher, Record};
use crate::services::uploader::{self, CsvUploader};
use crate::services::url_issuer::{
    Clock, HttpMethod, MAX_PUT_EXPIRY, PresignedUrl, SystemClock, UrlIssuer,
};

/// One export or import, built per call and never stored.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub bucket: String,
    pub key: String,
    pub entity: String,
    /// Lifetime of the upload URL.
    pub expiry: Duration,
}

impl TransferRequest {
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        entity: impl Into<String>,
        expiry: Duration,
    ) -> Result<Self, TransferError> {
        if expiry.is_zero() || expiry > MAX_PUT_EXPIRY {
            return Err(TransferError::InvalidExpiry {
                method: HttpMethod::Put,
                requested: expiry,
                max: MAX_PUT_EXPIRY,
            });
        }
        Ok(Self {
            bucket: bucket.into(),
            key: key.into(),
            entity: entity.into(),
            expiry,
        })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExportReceipt {
    pub bucket: String,
    pub key: String,
    pub entity: String,
    pub rows: usize,
    pub bytes: u64,
    pub pages: usize,
    pub download_url: String,
    pub expires_at: DateTime<Utc>,
}

/// Drives issuance -> pagination -> encoding -> upload, strictly in order.
pub struct TransferService {
    issuer: Arc<dyn UrlIssuer>,
    fetcher: PageFetcher,
    uploader: CsvUploader,
    http: Client,
    clock: Arc<dyn Clock>,
    page_size: u64,
    download_expiry: Duration,
}

impl TransferService {
    pub fn new(
        issuer: Arc<dyn UrlIssuer>,
        fetcher: PageFetcher,
        uploader: CsvUploader,
        http: Client,
        page_size: u64,
        download_expiry: Duration,
    ) -> Self {
        Self {
            issuer,
            fetcher,
            uploader,
            http,
            clock: Arc::new(SystemClock),
            page_size,
            download_expiry,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn issuer(&self) -> &Arc<dyn UrlIssuer> {
        &self.issuer
    }

    pub fn download_expiry(&self) -> Duration {
        self.download_expiry
    }

    /// Walks the data source from skip 0 in steps of `take` until a short or
    /// empty page. Returns the records in source order and the number of
    /// non-empty pages read.
    pub async fn collect_records(
        &self,
        entity: &str,
        take: u64,
    ) -> Result<(Vec<Record>, usize), TransferError> {
        if take == 0 {
            return Err(TransferError::InvalidPageSize);
        }

        let mut records = Vec::new();
        let mut pages = 0;
        let mut skip = 0;

        loop {
            let page = self.fetcher.fetch_page(entity, skip, take).await?;
            if !page.records.is_empty() {
                pages += 1;
            }
            let last = page.is_last();
            skip = page.next_skip();
            records.extend(page.records);
            if last {
                break;
            }
        }

        Ok((records, pages))
    }

    /// Exports every record of `request.entity` to `request.bucket/key` and
    /// hands back a download URL for the end client.
    pub async fn export(&self, request: &TransferRequest) -> Result<ExportReceipt, TransferError> {
        tracing::info!(
            "📤 Exporting {} to {}/{}",
            request.entity,
            request.bucket,
            request.key
        );

        let put_url = self
            .issuer
            .issue_put(&request.bucket, &request.key, request.expiry)
            .await?;

        let (records, pages) = self.collect_records(&request.entity, self.page_size).await?;

        let encoder = match request.entity.parse::<EntityKind>() {
            Ok(kind) => CsvEncoder::with_columns(kind.columns().iter().copied()),
            Err(_) => CsvEncoder::new(),
        };
        let payload = encoder.encode(&records)?;
        let bytes = uploader::content_length(&payload);

        if !put_url.is_usable_at(self.clock.now()) {
            tracing::warn!(
                "Upload URL for {}/{} expired at {} before upload",
                request.bucket,
                request.key,
                put_url.expires_at
            );
            return Err(TransferError::Expired(HttpMethod::Put));
        }

        self.uploader.upload(&put_url.url, payload).await?;

        let get_url = self
            .issuer
            .issue_get(
                &request.bucket,
                &request.key,
                &request.entity,
                self.download_expiry,
            )
            .await?;

        tracing::info!(
            "✅ Exported {} {} rows ({} bytes, {} pages)",
            records.len(),
            request.entity,
            bytes,
            pages
        );

        Ok(ExportReceipt {
            bucket: request.bucket.clone(),
            key: request.key.clone(),
            entity: request.entity.clone(),
            rows: records.len(),
            bytes,
            pages,
            download_url: get_url.url,
            expires_at: get_url.expires_at,
        })
    }

    pub async fn download_url(
        &self,
        bucket: &str,
        key: &str,
        entity: &str,
    ) -> Result<PresignedUrl, TransferError> {
        self.issuer
            .issue_get(bucket, key, entity, self.download_expiry)
            .await
    }

    /// Reads a previously exported CSV object back into records.
    pub async fn import(
        &self,
        bucket: &str,
        key: &str,
        entity: &str,
    ) -> Result<Vec<Record>, TransferError> {
        let get_url = self.download_url(bucket, key, entity).await?;
        let shown = get_url.redacted().to_string();

        let response = self
            .http
            .get(&get_url.url)
            .send()
            .await
            .map_err(|e| TransferError::Fetch {
                url: shown.clone(),
                status: None,
                message: e.without_url().to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Fetch {
                url: shown,
                status: Some(status),
                message: format!("unexpected status {}", status),
            });
        }

        let text = response.text().await.map_err(|e| TransferError::Fetch {
            url: shown.clone(),
            status: Some(status),
            message: e.without_url().to_string(),
        })?;

        let records = csv_codec::decode(&text)?;
        tracing::info!("📥 Imported {} {} rows from {}/{}", records.len(), entity, bucket, key);
        Ok(records)
    }
}
