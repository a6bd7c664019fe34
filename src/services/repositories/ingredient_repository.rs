use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{RepositoryError, insert_error};
use crate::entities::{prelude::*, *};

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct NewIngredient {
    #[validate(length(min = 1, max = 255, message = "Ingredient name must be 1-255 characters"))]
    pub name: String,
    pub unit: Option<String>,
}

pub struct IngredientRepository {
    db: DatabaseConnection,
}

impl IngredientRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_ingredient(
        &self,
        data: NewIngredient,
    ) -> Result<ingredients::Model, RepositoryError> {
        let ingredient = ingredients::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(data.name),
            unit: Set(data.unit),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| insert_error(e, "Ingredient name already exists"))?;

        tracing::info!("Created ingredient '{}'", ingredient.name);
        Ok(ingredient)
    }

    pub async fn list_ingredients(
        &self,
        skip: u64,
        take: u64,
    ) -> Result<Vec<ingredients::Model>, RepositoryError> {
        let ingredients = Ingredients::find()
            .order_by_asc(ingredients::Column::Name)
            .offset(skip)
            .limit(take)
            .all(&self.db)
            .await?;
        Ok(ingredients)
    }

    /// Recipe links to the ingredient go with it (cascade).
    pub async fn delete_ingredient(&self, id: &str) -> Result<ingredients::Model, RepositoryError> {
        let ingredient = Ingredients::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Ingredient {} not found", id)))?;

        ingredient.clone().delete(&self.db).await?;
        tracing::info!("Deleted ingredient {}", id);
        Ok(ingredient)
    }
}
