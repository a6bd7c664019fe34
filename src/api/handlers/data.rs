use crate::api::error::AppError;
use crate::entities::EntityKind;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::Value;

use super::PageQuery;

/// Flat rows of one entity, ordered by name. This is the collection the
/// export pipeline pages through via `BASE_URL`.
#[utoipa::path(
    get,
    path = "/data/{entity}",
    params(
        ("entity" = String, Path, description = "meal, component or ingredient"),
        ("skip" = Option<u64>, Query, description = "Rows to skip"),
        ("take" = Option<u64>, Query, description = "Rows to return")
    ),
    responses(
        (status = 200, description = "One page of flat records"),
        (status = 400, description = "Invalid page window"),
        (status = 404, description = "Unknown entity")
    ),
    tag = "data"
)]
pub async fn get_entity_page(
    State(state): State<crate::AppState>,
    Path(entity): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let kind: EntityKind = entity
        .parse()
        .map_err(|e: crate::entities::UnknownEntity| AppError::NotFound(e.to_string()))?;
    let (skip, take) = page.window()?;

    let rows = match kind {
        EntityKind::Meal => serde_json::to_value(state.meals.list_meals(skip, take).await?),
        EntityKind::Component => {
            serde_json::to_value(state.components.list_components(skip, take).await?)
        }
        EntityKind::Ingredient => {
            serde_json::to_value(state.ingredients.list_ingredients(skip, take).await?)
        }
    }
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(rows))
}
