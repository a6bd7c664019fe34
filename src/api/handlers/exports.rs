use crate::api::error::AppError;
use crate::entities::EntityKind;
use crate::services::transfer::{ExportReceipt, TransferRequest};
use crate::services::url_issuer::PresignedUrl;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ExportRequest {
    #[validate(length(min = 1, message = "entity is required"))]
    pub entity: String,
    /// Object key to write. Defaults to `<entity>/<timestamp>.csv`.
    #[validate(length(min = 1, max = 1024, message = "key must be 1-1024 characters"))]
    pub key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub key: String,
}

fn parse_entity(entity: &str) -> Result<EntityKind, AppError> {
    entity
        .parse()
        .map_err(|e: crate::entities::UnknownEntity| AppError::BadRequest(e.to_string()))
}

pub fn default_export_key(kind: EntityKind) -> String {
    format!("{}/{}.csv", kind, Utc::now().format("%Y%m%dT%H%M%SZ"))
}

#[utoipa::path(
    post,
    path = "/exports",
    request_body = ExportRequest,
    responses(
        (status = 201, description = "Entity exported to storage as CSV", body = ExportReceipt),
        (status = 400, description = "Unknown entity or invalid key"),
        (status = 502, description = "Data source or storage failed")
    ),
    tag = "exports"
)]
pub async fn create_export(
    State(state): State<crate::AppState>,
    Json(req): Json<ExportRequest>,
) -> Result<(StatusCode, Json<ExportReceipt>), AppError> {
    req.validate()?;
    let kind = parse_entity(&req.entity)?;
    let key = req.key.unwrap_or_else(|| default_export_key(kind));

    let request = TransferRequest::new(
        state.config.s3_bucket.clone(),
        key,
        kind.as_str(),
        state.config.put_url_expiry(),
    )?;

    let receipt = state.transfers.export(&request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[utoipa::path(
    get,
    path = "/exports/{entity}/url",
    params(
        ("entity" = String, Path, description = "Entity the export holds"),
        ("key" = String, Query, description = "Object key of the export")
    ),
    responses(
        (status = 200, description = "Presigned download URL", body = PresignedUrl),
        (status = 400, description = "Unknown entity")
    ),
    tag = "exports"
)]
pub async fn get_download_url(
    State(state): State<crate::AppState>,
    Path(entity): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Json<PresignedUrl>, AppError> {
    let kind = parse_entity(&entity)?;
    if query.key.is_empty() {
        return Err(AppError::BadRequest("key is required".to_string()));
    }

    let url = state
        .transfers
        .download_url(&state.config.s3_bucket, &query.key, kind.as_str())
        .await?;
    Ok(Json(url))
}
