use crate::config::AppConfig;
use crate::services::url_issuer::S3UrlIssuer;
use aws_sdk_s3::config::{Credentials, Region};
use std::sync::Arc;
use tracing::info;

/// Builds the S3 client used for signing. Static credentials and a custom
/// endpoint are only applied when configured; otherwise the default AWS
/// provider chain is used.
pub async fn setup_s3_client(config: &AppConfig) -> aws_sdk_s3::Client {
    let mut loader = aws_config::from_env().region(Region::new(config.s3_region.clone()));

    if let Some(endpoint) = &config.s3_endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    if let (Some(access_key), Some(secret_key)) = (&config.s3_access_key, &config.s3_secret_key) {
        loader = loader.credentials_provider(Credentials::new(
            access_key.clone(),
            secret_key.clone(),
            None,
            None,
            "static",
        ));
    }

    let aws_config = loader.load().await;

    // Path-style addressing for MinIO and other self-hosted endpoints.
    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.s3_endpoint.is_some())
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}

pub async fn setup_storage(config: &AppConfig) -> Arc<S3UrlIssuer> {
    info!(
        "☁️  S3 Storage: {} (Bucket: {}, Region: {})",
        config.s3_endpoint.as_deref().unwrap_or("aws"),
        config.s3_bucket,
        config.s3_region
    );

    let client = setup_s3_client(config).await;
    Arc::new(S3UrlIssuer::new(client))
}
