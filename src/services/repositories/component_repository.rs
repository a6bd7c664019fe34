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
pub struct NewComponent {
    #[validate(length(min = 1, max = 255, message = "Component name must be 1-255 characters"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct NewComponentIngredient {
    #[validate(length(min = 1, message = "ingredient_id is required"))]
    pub ingredient_id: String,
    #[validate(range(exclusive_min = 0.0, message = "Quantity must be positive"))]
    pub ingredient_quantity: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ComponentDetails {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    pub component_ingredients: Vec<ComponentIngredientDetails>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ComponentIngredientDetails {
    pub id: String,
    pub ingredient_id: String,
    pub ingredient_quantity: f64,
    #[schema(inline)]
    pub ingredient: Option<ingredients::Model>,
}

pub struct ComponentRepository {
    db: DatabaseConnection,
}

impl ComponentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_component(
        &self,
        data: NewComponent,
    ) -> Result<components::Model, RepositoryError> {
        tracing::info!("Creating component '{}'", data.name);

        let component = components::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(data.name),
            description: Set(data.description),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| insert_error(e, "Component name already exists"))?;

        Ok(component)
    }

    pub async fn create_component_ingredient(
        &self,
        component_id: &str,
        data: NewComponentIngredient,
    ) -> Result<component_ingredients::Model, RepositoryError> {
        Components::find_by_id(component_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                RepositoryError::NotFound(format!("Component {} not found", component_id))
            })?;
        Ingredients::find_by_id(data.ingredient_id.as_str())
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                RepositoryError::NotFound(format!("Ingredient {} not found", data.ingredient_id))
            })?;

        let link = component_ingredients::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            component_id: Set(component_id.to_string()),
            ingredient_id: Set(data.ingredient_id),
            ingredient_quantity: Set(data.ingredient_quantity),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(
            "Linked ingredient {} to component {}",
            link.ingredient_id,
            component_id
        );
        Ok(link)
    }

    pub async fn list_components(
        &self,
        skip: u64,
        take: u64,
    ) -> Result<Vec<components::Model>, RepositoryError> {
        let components = Components::find()
            .order_by_asc(components::Column::Name)
            .offset(skip)
            .limit(take)
            .all(&self.db)
            .await?;
        Ok(components)
    }

    pub async fn get_components(&self) -> Result<Vec<ComponentDetails>, RepositoryError> {
        let components = Components::find()
            .order_by_asc(components::Column::Name)
            .all(&self.db)
            .await?;
        self.with_ingredients(components).await
    }

    pub async fn search_components(
        &self,
        term: &str,
    ) -> Result<Vec<ComponentDetails>, RepositoryError> {
        let mut components = Components::find()
            .filter(components::Column::Name.contains(term))
            .order_by_asc(components::Column::Name)
            .all(&self.db)
            .await?;
        exact_match_first(&mut components, term, |c| c.name.as_str());
        self.with_ingredients(components).await
    }

    pub async fn remove_component_from_component_ingredients(
        &self,
        component_id: &str,
    ) -> Result<u64, RepositoryError> {
        let res = ComponentIngredients::delete_many()
            .filter(component_ingredients::Column::ComponentId.eq(component_id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn remove_component_from_meal_components(
        &self,
        component_id: &str,
    ) -> Result<u64, RepositoryError> {
        let res = MealComponents::delete_many()
            .filter(meal_components::Column::ComponentId.eq(component_id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn delete_component(&self, id: &str) -> Result<components::Model, RepositoryError> {
        let component = Components::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Component {} not found", id)))?;

        component.clone().delete(&self.db).await?;
        tracing::info!("Deleted component {}", id);
        Ok(component)
    }

    async fn with_ingredients(
        &self,
        components: Vec<components::Model>,
    ) -> Result<Vec<ComponentDetails>, RepositoryError> {
        let links = components
            .load_many(ComponentIngredients, &self.db)
            .await?;

        let ingredient_ids: Vec<String> = links
            .iter()
            .flatten()
            .map(|l| l.ingredient_id.clone())
            .collect();
        let ingredients: HashMap<String, ingredients::Model> = if ingredient_ids.is_empty() {
            HashMap::new()
        } else {
            Ingredients::find()
                .filter(ingredients::Column::Id.is_in(ingredient_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|i| (i.id.clone(), i))
                .collect()
        };

        Ok(components
            .into_iter()
            .zip(links)
            .map(|(component, links)| ComponentDetails {
                id: component.id,
                name: component.name,
                description: component.description,
                created_at: component.created_at,
                component_ingredients: links
                    .into_iter()
                    .map(|l| ComponentIngredientDetails {
                        ingredient: ingredients.get(&l.ingredient_id).cloned(),
                        id: l.id,
                        ingredient_id: l.ingredient_id,
                        ingredient_quantity: l.ingredient_quantity,
                    })
                    .collect(),
            })
            .collect())
    }
}
