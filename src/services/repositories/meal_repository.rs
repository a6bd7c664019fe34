use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, LoaderTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{RepositoryError, exact_match_first, insert_error};
use crate::entities::{prelude::*, *};

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct NewMeal {
    #[validate(length(min = 1, max = 255, message = "Meal name must be 1-255 characters"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct NewMealComponent {
    #[validate(length(min = 1, message = "component_id is required"))]
    pub component_id: String,
    #[validate(range(exclusive_min = 0.0, message = "Quantity must be positive"))]
    pub component_quantity: f64,
}

/// A meal with its components, in the shape API clients receive.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MealDetails {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    pub meal_components: Vec<MealComponentDetails>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MealComponentDetails {
    pub id: String,
    pub component_id: String,
    pub component_quantity: f64,
    #[schema(inline)]
    pub component: Option<components::Model>,
}

pub struct MealRepository {
    db: DatabaseConnection,
}

impl MealRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_meal(&self, data: NewMeal) -> Result<meals::Model, RepositoryError> {
        tracing::info!("Creating meal '{}'", data.name);

        let meal = meals::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(data.name),
            description: Set(data.description),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| insert_error(e, "Meal name already exists"))?;

        Ok(meal)
    }

    /// Flat, name-ordered window of meals. This is what exports read.
    pub async fn list_meals(&self, skip: u64, take: u64) -> Result<Vec<meals::Model>, RepositoryError> {
        let meals = Meals::find()
            .order_by_asc(meals::Column::Name)
            .offset(skip)
            .limit(take)
            .all(&self.db)
            .await?;
        Ok(meals)
    }

    pub async fn get_meals(&self) -> Result<Vec<MealDetails>, RepositoryError> {
        let meals = Meals::find()
            .order_by_asc(meals::Column::Name)
            .all(&self.db)
            .await?;
        self.with_components(meals).await
    }

    /// Meals whose name contains `term`, an exact match first.
    pub async fn search_meals(&self, term: &str) -> Result<Vec<MealDetails>, RepositoryError> {
        let mut meals = Meals::find()
            .filter(meals::Column::Name.contains(term))
            .order_by_asc(meals::Column::Name)
            .all(&self.db)
            .await?;
        exact_match_first(&mut meals, term, |m| m.name.as_str());
        self.with_components(meals).await
    }

    pub async fn create_meal_component(
        &self,
        meal_id: &str,
        data: NewMealComponent,
    ) -> Result<meal_components::Model, RepositoryError> {
        Meals::find_by_id(meal_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Meal {} not found", meal_id)))?;
        Components::find_by_id(data.component_id.as_str())
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                RepositoryError::NotFound(format!("Component {} not found", data.component_id))
            })?;

        let link = meal_components::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            meal_id: Set(meal_id.to_string()),
            component_id: Set(data.component_id),
            component_quantity: Set(data.component_quantity),
        }
        .insert(&self.db)
        .await?;

        tracing::info!("Linked component {} to meal {}", link.component_id, meal_id);
        Ok(link)
    }

    /// Returns the number of links removed.
    pub async fn remove_meal_from_meal_components(&self, meal_id: &str) -> Result<u64, RepositoryError> {
        let res = MealComponents::delete_many()
            .filter(meal_components::Column::MealId.eq(meal_id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn delete_meal(&self, id: &str) -> Result<meals::Model, RepositoryError> {
        let meal = Meals::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Meal {} not found", id)))?;

        meal.clone().delete(&self.db).await?;
        tracing::info!("Deleted meal {}", id);
        Ok(meal)
    }

    async fn with_components(&self, meals: Vec<meals::Model>) -> Result<Vec<MealDetails>, RepositoryError> {
        let links = meals.load_many(MealComponents, &self.db).await?;

        let component_ids: Vec<String> = links
            .iter()
            .flatten()
            .map(|l| l.component_id.clone())
            .collect();
        let components: HashMap<String, components::Model> = if component_ids.is_empty() {
            HashMap::new()
        } else {
            Components::find()
                .filter(components::Column::Id.is_in(component_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect()
        };

        Ok(meals
            .into_iter()
            .zip(links)
            .map(|(meal, links)| MealDetails {
                id: meal.id,
                name: meal.name,
                description: meal.description,
                created_at: meal.created_at,
                meal_components: links
                    .into_iter()
                    .map(|l| MealComponentDetails {
                        component: components.get(&l.component_id).cloned(),
                        id: l.id,
                        component_id: l.component_id,
                        component_quantity: l.component_quantity,
                    })
                    .collect(),
            })
            .collect())
    }
}
