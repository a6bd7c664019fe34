use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "meal_components")]
#[schema(as = MealComponent)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub meal_id: String,
    pub component_id: String,
    pub component_quantity: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::meals::Entity",
        from = "Column::MealId",
        to = "super::meals::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Meals,
    #[sea_orm(
        belongs_to = "super::components::Entity",
        from = "Column::ComponentId",
        to = "super::components::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Components,
}

impl Related<super::meals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Meals.def()
    }
}

impl Related<super::components::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Components.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
