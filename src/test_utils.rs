//! Shared test utilities for recipe-box.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::settings::RecipeRules,
    core::{
        catalog,
        recipe::{self, NewRecipe},
        user::{self, NewUser},
        validation::IngredientAmount,
    },
    entities,
    errors::Result,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output to the test harness. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test user with sensible defaults.
///
/// # Defaults
/// * `email`: `"{username}@example.com"`
/// * `first_name`: `"Test"`
/// * `last_name`: `"User"`
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
) -> Result<entities::user::Model> {
    user::create_user(
        db,
        NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        },
    )
    .await
}

/// Inserts a catalog ingredient directly; the catalog has no create operation.
pub async fn create_test_ingredient(
    db: &DatabaseConnection,
    name: &str,
    measurement_unit: &str,
) -> Result<entities::ingredient::Model> {
    entities::ingredient::ActiveModel {
        name: Set(name.to_string()),
        measurement_unit: Set(measurement_unit.to_string()),
        search_name: Set(name.to_lowercase()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a test tag named after its slug.
///
/// # Defaults
/// * `name`: the slug
/// * `color`: `"#49B64E"`
pub async fn create_test_tag(db: &DatabaseConnection, slug: &str) -> Result<entities::tag::Model> {
    catalog::create_tag(
        db,
        slug.to_string(),
        "#49B64E".to_string(),
        slug.to_string(),
    )
    .await
}

/// Creates a test recipe without tags.
///
/// # Arguments
/// * `ingredients` - `(ingredient_id, amount)` pairs
///
/// # Defaults
/// * `image`: `"recipes/test.png"`
/// * `text`: `"Test instructions"`
/// * `cooking_time`: 30
pub async fn create_test_recipe(
    db: &DatabaseConnection,
    author_id: i64,
    name: &str,
    ingredients: &[(i64, i32)],
) -> Result<entities::recipe::Model> {
    recipe::create_recipe(
        db,
        &RecipeRules::default(),
        author_id,
        NewRecipe {
            name: name.to_string(),
            image: "recipes/test.png".to_string(),
            text: "Test instructions".to_string(),
            cooking_time: 30,
            ingredients: ingredients
                .iter()
                .map(|&(id, amount)| IngredientAmount { id, amount })
                .collect(),
            tags: Vec::new(),
        },
    )
    .await
}

/// Creates a database with one author and one recipe ("Omelette": 3 eggs).
pub async fn setup_with_recipe() -> Result<(
    DatabaseConnection,
    entities::user::Model,
    entities::recipe::Model,
)> {
    let db = setup_test_db().await?;
    let author = create_test_user(&db, "author").await?;
    let egg = create_test_ingredient(&db, "egg", "pcs").await?;
    let recipe = create_test_recipe(&db, author.id, "Omelette", &[(egg.id, 3)]).await?;
    Ok((db, author, recipe))
}
