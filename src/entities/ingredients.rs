use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "ingredients")]
#[schema(as = Ingredient)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub name: String,
    /// Unit the quantities in component recipes are expressed in, e.g. "g".
    pub unit: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::component_ingredients::Entity")]
    ComponentIngredients,
}

impl Related<super::component_ingredients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ComponentIngredients.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
