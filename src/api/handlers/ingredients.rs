use crate::api::error::AppError;
use crate::entities::ingredients;
use crate::services::repositories::ingredient_repository::NewIngredient;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use super::PageQuery;

#[utoipa::path(
    post,
    path = "/ingredients",
    request_body = NewIngredient,
    responses(
        (status = 201, description = "Ingredient created", body = inline(ingredients::Model)),
        (status = 409, description = "Ingredient name already exists")
    ),
    tag = "ingredients"
)]
pub async fn create_ingredient(
    State(state): State<crate::AppState>,
    Json(req): Json<NewIngredient>,
) -> Result<(StatusCode, Json<ingredients::Model>), AppError> {
    req.validate()?;
    let ingredient = state.ingredients.create_ingredient(req).await?;
    Ok((StatusCode::CREATED, Json(ingredient)))
}

#[utoipa::path(
    get,
    path = "/ingredients",
    params(
        ("skip" = Option<u64>, Query, description = "Rows to skip"),
        ("take" = Option<u64>, Query, description = "Rows to return")
    ),
    responses(
        (status = 200, description = "Ingredients ordered by name", body = inline(Vec<ingredients::Model>))
    ),
    tag = "ingredients"
)]
pub async fn list_ingredients(
    State(state): State<crate::AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<ingredients::Model>>, AppError> {
    let (skip, take) = page.window()?;
    Ok(Json(state.ingredients.list_ingredients(skip, take).await?))
}

#[utoipa::path(
    delete,
    path = "/ingredients/{id}",
    params(
        ("id" = String, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 200, description = "Ingredient deleted", body = inline(ingredients::Model)),
        (status = 404, description = "Ingredient not found")
    ),
    tag = "ingredients"
)]
pub async fn delete_ingredient(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Json<ingredients::Model>, AppError> {
    Ok(Json(state.ingredients.delete_ingredient(&id).await?))
}
