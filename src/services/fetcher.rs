use reqwest::Client;
use serde_json::{Map, Value};
use url::Url;

use crate::services::error::TransferError;

/// Largest `take` the service's own data source accepts.
pub const MAX_PAGE_SIZE: u64 = 1000;

/// A schema-free JSON object as served by the data source. Key order is kept.
pub type Record = Map<String, Value>;

/// One window of an ordered upstream collection.
#[derive(Debug, Clone)]
pub struct Page {
    pub skip: u64,
    pub take: u64,
    pub records: Vec<Record>,
}

impl Page {
    /// A page shorter than requested is the end of the stream.
    pub fn is_last(&self) -> bool {
        (self.records.len() as u64) < self.take
    }

    pub fn next_skip(&self) -> u64 {
        self.skip + self.take
    }
}

/// Reads entity collections from `{base_url}{entity}?skip=&take=`.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
    base_url: String,
}

impl PageFetcher {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_url(&self, entity: &str, skip: u64, take: u64) -> String {
        format!("{}{}?skip={}&take={}", self.base_url, entity, skip, take)
    }

    /// Fetches a single page. One request, no retry.
    pub async fn fetch_page(
        &self,
        entity: &str,
        skip: u64,
        take: u64,
    ) -> Result<Page, TransferError> {
        let url = self.page_url(entity, skip, take);
        let target = Url::parse(&url).map_err(|e| TransferError::Fetch {
            url: url.clone(),
            status: None,
            message: format!("invalid URL: {}", e),
        })?;

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| fetch_error(&url, None, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Data source answered {} for {}", status, url);
            return Err(TransferError::Fetch {
                url,
                status: Some(status),
                message: format!("unexpected status {}", status),
            });
        }

        let records: Vec<Record> = response
            .json()
            .await
            .map_err(|e| fetch_error(&url, Some(status), e))?;

        tracing::debug!("Fetched {} {} records at skip={}", records.len(), entity, skip);

        Ok(Page {
            skip,
            take,
            records,
        })
    }
}

fn fetch_error(url: &str, status: Option<reqwest::StatusCode>, err: reqwest::Error) -> TransferError {
    TransferError::Fetch {
        url: url.to_string(),
        status,
        message: err.to_string(),
    }
}
