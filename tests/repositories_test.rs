use meal_data_service::infrastructure::database;
use meal_data_service::services::repositories::component_repository::{
    NewComponent, NewComponentIngredient,
};
use meal_data_service::services::repositories::ingredient_repository::NewIngredient;
use meal_data_service::services::repositories::meal_repository::{NewMeal, NewMealComponent};
use meal_data_service::services::repositories::{
    ComponentRepository, IngredientRepository, MealRepository, RepositoryError,
};
use sea_orm::DatabaseConnection;

async fn setup() -> DatabaseConnection {
    database::setup_database("sqlite::memory:").await.unwrap()
}

fn component(name: &str) -> NewComponent {
    NewComponent {
        name: name.to_string(),
        description: None,
    }
}

fn ingredient(name: &str, unit: &str) -> NewIngredient {
    NewIngredient {
        name: name.to_string(),
        unit: Some(unit.to_string()),
    }
}

#[tokio::test]
async fn test_component_ingredients_are_nested_and_unlinked() {
    let db = setup().await;
    let components = ComponentRepository::new(db.clone());
    let ingredients = IngredientRepository::new(db.clone());
    let meals = MealRepository::new(db.clone());

    let dough = components.create_component(component("Dough")).await.unwrap();
    let flour = ingredients
        .create_ingredient(ingredient("Flour", "g"))
        .await
        .unwrap();
    let water = ingredients
        .create_ingredient(ingredient("Water", "ml"))
        .await
        .unwrap();

    for (id, quantity) in [(&flour.id, 500.0), (&water.id, 325.0)] {
        components
            .create_component_ingredient(
                &dough.id,
                NewComponentIngredient {
                    ingredient_id: id.clone(),
                    ingredient_quantity: quantity,
                },
            )
            .await
            .unwrap();
    }

    let pizza = meals
        .create_meal(NewMeal {
            name: "Pizza".into(),
            description: None,
        })
        .await
        .unwrap();
    meals
        .create_meal_component(
            &pizza.id,
            NewMealComponent {
                component_id: dough.id.clone(),
                component_quantity: 1.0,
            },
        )
        .await
        .unwrap();

    let listed = components.get_components().await.unwrap();
    assert_eq!(listed.len(), 1);
    let mut names: Vec<String> = listed[0]
        .component_ingredients
        .iter()
        .filter_map(|l| l.ingredient.as_ref().map(|i| i.name.clone()))
        .collect();
    names.sort();
    assert_eq!(names, vec!["Flour", "Water"]);

    // Unlink from both sides before deleting
    assert_eq!(
        components
            .remove_component_from_component_ingredients(&dough.id)
            .await
            .unwrap(),
        2
    );
    assert_eq!(
        components
            .remove_component_from_meal_components(&dough.id)
            .await
            .unwrap(),
        1
    );
    components.delete_component(&dough.id).await.unwrap();

    let pizza = meals.search_meals("Pizza").await.unwrap();
    assert!(pizza[0].meal_components.is_empty());
    assert!(components.get_components().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_linking_unknown_rows_is_not_found() {
    let db = setup().await;
    let components = ComponentRepository::new(db.clone());
    let meals = MealRepository::new(db.clone());

    let sauce = components.create_component(component("Sauce")).await.unwrap();

    let err = components
        .create_component_ingredient(
            &sauce.id,
            NewComponentIngredient {
                ingredient_id: "nope".into(),
                ingredient_quantity: 1.0,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound(_)));

    let err = meals
        .create_meal_component(
            "nope",
            NewMealComponent {
                component_id: sauce.id.clone(),
                component_quantity: 1.0,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound(_)));
}

#[tokio::test]
async fn test_unique_names_conflict() {
    let db = setup().await;
    let ingredients = IngredientRepository::new(db.clone());
    let components = ComponentRepository::new(db.clone());

    ingredients
        .create_ingredient(ingredient("Salt", "g"))
        .await
        .unwrap();
    let err = ingredients
        .create_ingredient(ingredient("Salt", "kg"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    components.create_component(component("Stock")).await.unwrap();
    let err = components
        .create_component(component("Stock"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

#[tokio::test]
async fn test_deleting_ingredient_cascades_to_links() {
    let db = setup().await;
    let components = ComponentRepository::new(db.clone());
    let ingredients = IngredientRepository::new(db.clone());

    let roux = components.create_component(component("Roux")).await.unwrap();
    let butter = ingredients
        .create_ingredient(ingredient("Butter", "g"))
        .await
        .unwrap();
    components
        .create_component_ingredient(
            &roux.id,
            NewComponentIngredient {
                ingredient_id: butter.id.clone(),
                ingredient_quantity: 50.0,
            },
        )
        .await
        .unwrap();

    ingredients.delete_ingredient(&butter.id).await.unwrap();

    let listed = components.get_components().await.unwrap();
    assert!(listed[0].component_ingredients.is_empty());

    let err = ingredients.delete_ingredient(&butter.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound(_)));
}

#[tokio::test]
async fn test_list_windows_are_name_ordered() {
    let db = setup().await;
    let components = ComponentRepository::new(db.clone());

    for name in ["Gravy", "Apple sauce", "Pesto", "Custard"] {
        components.create_component(component(name)).await.unwrap();
    }

    let page: Vec<String> = components
        .list_components(1, 2)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(page, vec!["Custard", "Gravy"]);

    let tail = components.list_components(4, 2).await.unwrap();
    assert!(tail.is_empty());

    let found: Vec<String> = components
        .search_components("sauce")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(found, vec!["Apple sauce"]);
}
