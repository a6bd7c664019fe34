use clap::Parser;
use dotenvy::dotenv;
use meal_data_service::api::handlers::exports::default_export_key;
use meal_data_service::config::AppConfig;
use meal_data_service::entities::EntityKind;
use meal_data_service::infrastructure::storage;
use meal_data_service::services::fetcher::PageFetcher;
use meal_data_service::services::transfer::{TransferRequest, TransferService};
use meal_data_service::services::uploader::CsvUploader;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Export one entity from the configured data source to object storage as CSV
#[derive(Parser, Debug)]
#[command(name = "export_entity")]
struct Args {
    /// meal, component or ingredient
    #[arg(short, long)]
    entity: String,

    /// Object key to write (default: <entity>/<timestamp>.csv)
    #[arg(short, long)]
    key: Option<String>,

    /// Override BASE_URL
    #[arg(long)]
    base_url: Option<String>,

    /// Override EXPORT_PAGE_SIZE
    #[arg(long)]
    page_size: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "export_entity=info,meal_data_service=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env();
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(page_size) = args.page_size {
        config.export_page_size = page_size;
    }
    let config = config.normalized();

    let kind: EntityKind = args.entity.parse()?;
    let key = args.key.unwrap_or_else(|| default_export_key(kind));

    info!("📦 Exporting {} from {}", kind, config.base_url);

    let issuer = storage::setup_storage(&config).await;
    let http = reqwest::Client::new();
    let transfers = TransferService::new(
        issuer,
        PageFetcher::new(http.clone(), config.base_url.clone()),
        CsvUploader::new(http.clone()),
        http,
        config.export_page_size,
        config.get_url_expiry(),
    );

    let request = TransferRequest::new(
        config.s3_bucket.clone(),
        key,
        kind.as_str(),
        config.put_url_expiry(),
    )?;

    match transfers.export(&request).await {
        Ok(receipt) => {
            info!(
                "✅ Wrote {} rows ({} bytes) to {}/{}",
                receipt.rows, receipt.bytes, receipt.bucket, receipt.key
            );
            println!("{}", receipt.download_url);
            Ok(())
        }
        Err(e) => {
            error!("❌ Export failed: {}", e);
            Err(e.into())
        }
    }
}
