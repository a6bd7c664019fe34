use std::env;
use std::time::Duration;

use crate::services::fetcher::MAX_PAGE_SIZE;
use crate::services::url_issuer::{MAX_GET_EXPIRY, MAX_PUT_EXPIRY};

/// Service configuration, read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Prefix of the data source the export pipeline reads, used verbatim
    /// before the entity name (default: "http://127.0.0.1:3000/data/")
    pub base_url: String,

    /// Database connection string (default: "sqlite::memory:")
    pub database_url: String,

    /// Bucket exports are written to (default: "meal-data-exports")
    pub s3_bucket: String,

    /// Signing region (default: "us-east-1")
    pub s3_region: String,

    /// Custom S3 endpoint, e.g. MinIO. Unset means AWS.
    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,

    /// Upload URL lifetime in seconds (default and max: 120)
    pub put_url_expiry_secs: u64,

    /// Download URL lifetime in seconds (default and max: 300)
    pub get_url_expiry_secs: u64,

    /// Records requested per page while exporting (default: 100)
    pub export_page_size: u64,

    /// Address the HTTP API binds to (default: "127.0.0.1:3000")
    pub listen_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/data/".to_string(),
            database_url: "sqlite::memory:".to_string(),
            s3_bucket: "meal-data-exports".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_endpoint: None,
            s3_access_key: None,
            s3_secret_key: None,
            put_url_expiry_secs: MAX_PUT_EXPIRY.as_secs(),
            get_url_expiry_secs: MAX_GET_EXPIRY.as_secs(),
            export_page_size: 100,
            listen_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            base_url: env::var("BASE_URL").unwrap_or(default.base_url),

            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),

            s3_bucket: env::var("S3_BUCKET").unwrap_or(default.s3_bucket),

            s3_region: env::var("S3_REGION").unwrap_or(default.s3_region),

            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_access_key: env::var("S3_ACCESS_KEY").ok(),
            s3_secret_key: env::var("S3_SECRET_KEY").ok(),

            put_url_expiry_secs: env::var("PUT_URL_EXPIRY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.put_url_expiry_secs),

            get_url_expiry_secs: env::var("GET_URL_EXPIRY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.get_url_expiry_secs),

            export_page_size: env::var("EXPORT_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.export_page_size),

            listen_addr: env::var("LISTEN_ADDR").unwrap_or(default.listen_addr),
        }
        .normalized()
    }

    /// Local MinIO with its stock credentials.
    pub fn development() -> Self {
        Self {
            s3_endpoint: Some("http://127.0.0.1:9000".to_string()),
            s3_access_key: Some("minioadmin".to_string()),
            s3_secret_key: Some("minioadmin".to_string()),
            export_page_size: 50,
            ..Self::default()
        }
    }

    /// Clamps URL lifetimes into (0, max] and the page size into
    /// 1..=MAX_PAGE_SIZE.
    pub fn normalized(mut self) -> Self {
        self.put_url_expiry_secs = self.put_url_expiry_secs.clamp(1, MAX_PUT_EXPIRY.as_secs());
        self.get_url_expiry_secs = self.get_url_expiry_secs.clamp(1, MAX_GET_EXPIRY.as_secs());
        self.export_page_size = self.export_page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn put_url_expiry(&self) -> Duration {
        Duration::from_secs(self.put_url_expiry_secs)
    }

    pub fn get_url_expiry(&self) -> Duration {
        Duration::from_secs(self.get_url_expiry_secs)
    }
}
