pub mod component_repository;
pub mod ingredient_repository;
pub mod meal_repository;

pub use component_repository::ComponentRepository;
pub use ingredient_repository::IngredientRepository;
pub use meal_repository::MealRepository;

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Maps a unique-constraint violation on insert to `Conflict`.
pub(crate) fn insert_error(err: DbErr, conflict: impl Into<String>) -> RepositoryError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => RepositoryError::Conflict(conflict.into()),
        _ => RepositoryError::Database(err),
    }
}

/// Case-sensitive substring match on names puts the exact match first and
/// keeps the remaining (already name-ordered) results stable.
pub(crate) fn exact_match_first<T>(items: &mut [T], term: &str, name: impl Fn(&T) -> &str) {
    items.sort_by_key(|item| name(item) != term);
}
