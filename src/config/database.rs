//! Database configuration module for recipe-box.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Composite uniqueness (one favorite per
//! user and recipe, one line per recipe and ingredient, ...) cannot be expressed on the
//! entity itself and is added as explicit unique indexes.

use crate::entities::{
    CartEntry, CartEntryColumn, Favorite, FavoriteColumn, Follow, FollowColumn, Ingredient,
    Recipe, RecipeIngredient, RecipeIngredientColumn, RecipeTag, Tag, User,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement, IntoIden, IntoTableRef, TableCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info, instrument};

/// Establishes a connection to the database at `database_url`.
///
/// # Errors
/// Returns an error if the URL is malformed or the database cannot be opened.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

fn create_table_stmt<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    schema.create_table_from_entity(entity).if_not_exists().to_owned()
}

fn unique_pair_index<T, C1, C2>(name: &str, table: T, first: C1, second: C2) -> IndexCreateStatement
where
    T: IntoTableRef,
    C1: IntoIden,
    C2: IntoIden,
{
    Index::create()
        .name(name)
        .table(table)
        .col(first)
        .col(second)
        .unique()
        .if_not_exists()
        .to_owned()
}

/// Creates all tables and unique indexes, skipping any that already exist.
///
/// Tables are created leaf-first so foreign keys always point at existing tables.
///
/// # Errors
/// Returns an error if any DDL statement fails.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        create_table_stmt(&schema, User),
        create_table_stmt(&schema, Ingredient),
        create_table_stmt(&schema, Tag),
        create_table_stmt(&schema, Recipe),
        create_table_stmt(&schema, RecipeIngredient),
        create_table_stmt(&schema, RecipeTag),
        create_table_stmt(&schema, Favorite),
        create_table_stmt(&schema, CartEntry),
        create_table_stmt(&schema, Follow),
    ];
    for table in &tables {
        db.execute(builder.build(table)).await?;
    }

    let indexes = [
        unique_pair_index(
            "idx_recipe_ingredients_recipe_ingredient",
            RecipeIngredient,
            RecipeIngredientColumn::RecipeId,
            RecipeIngredientColumn::IngredientId,
        ),
        unique_pair_index(
            "idx_favorites_user_recipe",
            Favorite,
            FavoriteColumn::UserId,
            FavoriteColumn::RecipeId,
        ),
        unique_pair_index(
            "idx_cart_entries_user_recipe",
            CartEntry,
            CartEntryColumn::UserId,
            CartEntryColumn::RecipeId,
        ),
        unique_pair_index(
            "idx_follows_user_author",
            Follow,
            FollowColumn::UserId,
            FollowColumn::AuthorId,
        ),
    ];
    for index in &indexes {
        db.execute(builder.build(index)).await?;
    }

    info!("Database tables and unique indexes ensured");
    Ok(())
}
