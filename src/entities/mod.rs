pub mod prelude;

pub mod component_ingredients;
pub mod components;
pub mod ingredients;
pub mod meal_components;
pub mod meals;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The exportable tables. Column lists mirror the serialized field order of
/// each model, so CSV headers are fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Meal,
    Component,
    Ingredient,
}

#[derive(Error, Debug)]
#[error("Unknown entity: {0}")]
pub struct UnknownEntity(pub String);

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Meal, EntityKind::Component, EntityKind::Ingredient];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Meal => "meal",
            EntityKind::Component => "component",
            EntityKind::Ingredient => "ingredient",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            EntityKind::Meal => &["id", "name", "description", "created_at"],
            EntityKind::Component => &["id", "name", "description", "created_at"],
            EntityKind::Ingredient => &["id", "name", "unit", "created_at"],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownEntity;

    /// Accepts singular and plural names in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "meal" | "meals" => Ok(EntityKind::Meal),
            "component" | "components" => Ok(EntityKind::Component),
            "ingredient" | "ingredients" => Ok(EntityKind::Ingredient),
            _ => Err(UnknownEntity(s.to_string())),
        }
    }
}
