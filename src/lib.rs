pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;

use crate::config::AppConfig;
use crate::services::fetcher::PageFetcher;
use crate::services::repositories::{ComponentRepository, IngredientRepository, MealRepository};
use crate::services::transfer::TransferService;
use crate::services::uploader::CsvUploader;
use crate::services::url_issuer::UrlIssuer;
use axum::{
    Router,
    middleware::from_fn,
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::meals::create_meal,
        api::handlers::meals::get_meals,
        api::handlers::meals::search_meals,
        api::handlers::meals::add_meal_component,
        api::handlers::meals::delete_meal,
        api::handlers::components::create_component,
        api::handlers::components::get_components,
        api::handlers::components::search_components,
        api::handlers::components::add_component_ingredient,
        api::handlers::components::delete_component,
        api::handlers::ingredients::create_ingredient,
        api::handlers::ingredients::list_ingredients,
        api::handlers::ingredients::delete_ingredient,
        api::handlers::data::get_entity_page,
        api::handlers::exports::create_export,
        api::handlers::exports::get_download_url,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::exports::ExportRequest,
            services::repositories::meal_repository::NewMeal,
            services::repositories::meal_repository::NewMealComponent,
            services::repositories::meal_repository::MealDetails,
            services::repositories::meal_repository::MealComponentDetails,
            services::repositories::component_repository::NewComponent,
            services::repositories::component_repository::NewComponentIngredient,
            services::repositories::component_repository::ComponentDetails,
            services::repositories::component_repository::ComponentIngredientDetails,
            services::repositories::ingredient_repository::NewIngredient,
            services::transfer::ExportReceipt,
            services::url_issuer::PresignedUrl,
            services::url_issuer::HttpMethod,
        )
    ),
    tags(
        (name = "meals", description = "Meal management endpoints"),
        (name = "components", description = "Component management endpoints"),
        (name = "ingredients", description = "Ingredient management endpoints"),
        (name = "data", description = "Paged entity data source"),
        (name = "exports", description = "Bulk CSV exports via presigned URLs")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub meals: Arc<MealRepository>,
    pub components: Arc<ComponentRepository>,
    pub ingredients: Arc<IngredientRepository>,
    pub transfers: Arc<TransferService>,
    pub config: AppConfig,
}

impl AppState {
    /// Wires repositories and the transfer pipeline around the given handles.
    pub fn new(db: DatabaseConnection, issuer: Arc<dyn UrlIssuer>, config: AppConfig) -> Self {
        let config = config.normalized();
        let http = reqwest::Client::new();
        let transfers = TransferService::new(
            issuer,
            PageFetcher::new(http.clone(), config.base_url.clone()),
            CsvUploader::new(http.clone()),
            http,
            config.export_page_size,
            config.get_url_expiry(),
        );

        Self {
            meals: Arc::new(MealRepository::new(db.clone())),
            components: Arc::new(ComponentRepository::new(db.clone())),
            ingredients: Arc::new(IngredientRepository::new(db.clone())),
            transfers: Arc::new(transfers),
            db,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/meals",
            post(api::handlers::meals::create_meal).get(api::handlers::meals::get_meals),
        )
        .route("/meals/search", get(api::handlers::meals::search_meals))
        .route(
            "/meals/:id/components",
            post(api::handlers::meals::add_meal_component),
        )
        .route("/meals/:id", delete(api::handlers::meals::delete_meal))
        .route(
            "/components",
            post(api::handlers::components::create_component)
                .get(api::handlers::components::get_components),
        )
        .route(
            "/components/search",
            get(api::handlers::components::search_components),
        )
        .route(
            "/components/:id/ingredients",
            post(api::handlers::components::add_component_ingredient),
        )
        .route(
            "/components/:id",
            delete(api::handlers::components::delete_component),
        )
        .route(
            "/ingredients",
            post(api::handlers::ingredients::create_ingredient)
                .get(api::handlers::ingredients::list_ingredients),
        )
        .route(
            "/ingredients/:id",
            delete(api::handlers::ingredients::delete_ingredient),
        )
        .route(
            "/data/:entity",
            get(api::handlers::data::get_entity_page),
        )
        .route("/exports", post(api::handlers::exports::create_export))
        .route(
            "/exports/:entity/url",
            get(api::handlers::exports::get_download_url),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
