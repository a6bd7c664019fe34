use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};

use crate::services::error::TransferError;
use crate::services::url_issuer::CSV_CONTENT_TYPE;

/// Exact UTF-8 byte length of the payload, as sent in `Content-Length`.
pub fn content_length(payload: &str) -> u64 {
    payload.len() as u64
}

/// PUTs fully assembled CSV payloads to presigned URLs.
#[derive(Clone)]
pub struct CsvUploader {
    client: Client,
}

impl CsvUploader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Sends the payload in a single request and buffers the whole response
    /// body before returning it. Either the storage endpoint acknowledged the
    /// object or an error comes back.
    pub async fn upload(&self, url: &str, payload: String) -> Result<String, TransferError> {
        let length = content_length(&payload);

        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, CSV_CONTENT_TYPE)
            .header(CONTENT_LENGTH, length)
            .body(payload)
            .send()
            .await
            .map_err(|e| TransferError::Transport(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransferError::Transport(e.without_url()))?;

        if !status.is_success() {
            tracing::error!("Storage rejected upload with {}: {}", status, body);
            return Err(TransferError::UploadRejected { status, body });
        }

        tracing::info!("Uploaded {} bytes of CSV", length);
        Ok(body)
    }
}
