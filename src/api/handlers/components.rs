use crate::api::error::AppError;
use crate::entities::{component_ingredients, components};
use crate::services::repositories::component_repository::{
    ComponentDetails, NewComponent, NewComponentIngredient,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use super::SearchQuery;

#[utoipa::path(
    post,
    path = "/components",
    request_body = NewComponent,
    responses(
        (status = 201, description = "Component created", body = inline(components::Model)),
        (status = 400, description = "Invalid component"),
        (status = 409, description = "Component name already exists")
    ),
    tag = "components"
)]
pub async fn create_component(
    State(state): State<crate::AppState>,
    Json(req): Json<NewComponent>,
) -> Result<(StatusCode, Json<components::Model>), AppError> {
    req.validate()?;
    let component = state.components.create_component(req).await?;
    Ok((StatusCode::CREATED, Json(component)))
}

#[utoipa::path(
    get,
    path = "/components",
    responses(
        (status = 200, description = "All components with their ingredients", body = Vec<ComponentDetails>)
    ),
    tag = "components"
)]
pub async fn get_components(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<ComponentDetails>>, AppError> {
    Ok(Json(state.components.get_components().await?))
}

#[utoipa::path(
    get,
    path = "/components/search",
    params(
        ("name" = String, Query, description = "Substring of the component name")
    ),
    responses(
        (status = 200, description = "Matching components, exact match first", body = Vec<ComponentDetails>)
    ),
    tag = "components"
)]
pub async fn search_components(
    State(state): State<crate::AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ComponentDetails>>, AppError> {
    Ok(Json(state.components.search_components(&query.name).await?))
}

#[utoipa::path(
    post,
    path = "/components/{id}/ingredients",
    params(
        ("id" = String, Path, description = "Component ID")
    ),
    request_body = NewComponentIngredient,
    responses(
        (status = 201, description = "Ingredient added to component", body = inline(component_ingredients::Model)),
        (status = 404, description = "Component or ingredient not found")
    ),
    tag = "components"
)]
pub async fn add_component_ingredient(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(req): Json<NewComponentIngredient>,
) -> Result<(StatusCode, Json<component_ingredients::Model>), AppError> {
    req.validate()?;
    let link = state.components.create_component_ingredient(&id, req).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

#[utoipa::path(
    delete,
    path = "/components/{id}",
    params(
        ("id" = String, Path, description = "Component ID")
    ),
    responses(
        (status = 200, description = "Component deleted", body = inline(components::Model)),
        (status = 404, description = "Component not found")
    ),
    tag = "components"
)]
pub async fn delete_component(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Json<components::Model>, AppError> {
    // Detach from recipes and meals before the row goes away
    state
        .components
        .remove_component_from_component_ingredients(&id)
        .await?;
    state
        .components
        .remove_component_from_meal_components(&id)
        .await?;
    Ok(Json(state.components.delete_component(&id).await?))
}
