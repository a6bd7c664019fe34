use crate::api::error::AppError;
use crate::entities::{meal_components, meals};
use crate::services::repositories::meal_repository::{MealDetails, NewMeal, NewMealComponent};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use super::SearchQuery;

#[utoipa::path(
    post,
    path = "/meals",
    request_body = NewMeal,
    responses(
        (status = 201, description = "Meal created", body = inline(meals::Model)),
        (status = 400, description = "Invalid meal"),
        (status = 409, description = "Meal name already exists")
    ),
    tag = "meals"
)]
pub async fn create_meal(
    State(state): State<crate::AppState>,
    Json(req): Json<NewMeal>,
) -> Result<(StatusCode, Json<meals::Model>), AppError> {
    req.validate()?;
    let meal = state.meals.create_meal(req).await?;
    Ok((StatusCode::CREATED, Json(meal)))
}

#[utoipa::path(
    get,
    path = "/meals",
    responses(
        (status = 200, description = "All meals with their components", body = Vec<MealDetails>)
    ),
    tag = "meals"
)]
pub async fn get_meals(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<MealDetails>>, AppError> {
    Ok(Json(state.meals.get_meals().await?))
}

#[utoipa::path(
    get,
    path = "/meals/search",
    params(
        ("name" = String, Query, description = "Substring of the meal name")
    ),
    responses(
        (status = 200, description = "Matching meals, exact match first", body = Vec<MealDetails>)
    ),
    tag = "meals"
)]
pub async fn search_meals(
    State(state): State<crate::AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<MealDetails>>, AppError> {
    Ok(Json(state.meals.search_meals(&query.name).await?))
}

#[utoipa::path(
    post,
    path = "/meals/{id}/components",
    params(
        ("id" = String, Path, description = "Meal ID")
    ),
    request_body = NewMealComponent,
    responses(
        (status = 201, description = "Component added to meal", body = inline(meal_components::Model)),
        (status = 404, description = "Meal or component not found")
    ),
    tag = "meals"
)]
pub async fn add_meal_component(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(req): Json<NewMealComponent>,
) -> Result<(StatusCode, Json<meal_components::Model>), AppError> {
    req.validate()?;
    let link = state.meals.create_meal_component(&id, req).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

#[utoipa::path(
    delete,
    path = "/meals/{id}",
    params(
        ("id" = String, Path, description = "Meal ID")
    ),
    responses(
        (status = 200, description = "Meal deleted", body = inline(meals::Model)),
        (status = 404, description = "Meal not found")
    ),
    tag = "meals"
)]
pub async fn delete_meal(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Json<meals::Model>, AppError> {
    let unlinked = state.meals.remove_meal_from_meal_components(&id).await?;
    tracing::debug!("Removed {} component links of meal {}", unlinked, id);
    Ok(Json(state.meals.delete_meal(&id).await?))
}
