use crate::entities::{component_ingredients, components, ingredients, meal_components, meals};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm::{ConnectionTrait, Schema};
use std::time::Duration;
use tracing::info;

pub async fn setup_database(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(20)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    // Every pooled connection to an in-memory SQLite database sees its own
    // empty database.
    if db_url.contains(":memory:") {
        opt.max_connections(1);
    }

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("🔄 Running auto-migrations...");

    // Parents before the join tables that reference them
    let stmts = vec![
        (
            "meals",
            schema
                .create_table_from_entity(meals::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "components",
            schema
                .create_table_from_entity(components::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "ingredients",
            schema
                .create_table_from_entity(ingredients::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "meal_components",
            schema
                .create_table_from_entity(meal_components::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "component_ingredients",
            schema
                .create_table_from_entity(component_ingredients::Entity)
                .if_not_exists()
                .to_owned(),
        ),
    ];

    for (name, stmt) in stmts {
        db.execute(builder.build(&stmt))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create table '{}': {}", name, e))?;
        info!("   - Table '{}' checked/created", name);
    }

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_meal_components_meal_id ON meal_components(meal_id)",
        "CREATE INDEX IF NOT EXISTS idx_meal_components_component_id ON meal_components(component_id)",
        "CREATE INDEX IF NOT EXISTS idx_component_ingredients_component_id ON component_ingredients(component_id)",
        "CREATE INDEX IF NOT EXISTS idx_component_ingredients_ingredient_id ON component_ingredients(ingredient_id)",
    ];

    for query in indexes {
        db.execute(sea_orm::Statement::from_string(builder, query.to_owned()))
            .await?;
        tracing::debug!("   - Executed schema update: {}", query);
    }

    Ok(())
}
