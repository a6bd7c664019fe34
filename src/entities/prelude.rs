pub use super::component_ingredients::Entity as ComponentIngredients;
pub use super::components::Entity as Components;
pub use super::ingredients::Entity as Ingredients;
pub use super::meal_components::Entity as MealComponents;
pub use super::meals::Entity as Meals;
