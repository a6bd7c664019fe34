use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::services::url_issuer::HttpMethod;

/// Failures of the bulk transfer pipeline. None of them are retried here.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Failed to sign {method} URL for {bucket}/{key}: {message}")]
    Signing {
        method: HttpMethod,
        bucket: String,
        key: String,
        message: String,
    },

    #[error("Expiry of {requested:?} is outside the allowed window (max {max:?}) for {method} URLs")]
    InvalidExpiry {
        method: HttpMethod,
        requested: Duration,
        max: Duration,
    },

    #[error("Presigned {0} URL expired before it was used")]
    Expired(HttpMethod),

    #[error("Failed to fetch {url}: {message}")]
    Fetch {
        url: String,
        status: Option<StatusCode>,
        message: String,
    },

    #[error("Page size must be greater than zero")]
    InvalidPageSize,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Upload transport failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Storage rejected upload with {status}: {body}")]
    UploadRejected { status: StatusCode, body: String },
}

impl TransferError {
    /// True when the caller supplied something unusable, as opposed to a
    /// collaborator failing.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TransferError::InvalidExpiry { .. } | TransferError::InvalidPageSize
        )
    }
}
