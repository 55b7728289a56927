//! Favorite entity - A user's bookmark on a recipe.
//!
//! (`user_id`, `recipe_id`) is unique; the index is created alongside the tables.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Favorite database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "favorites")]
pub struct Model {
    /// Unique identifier for the bookmark
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who favorited the recipe
    pub user_id: i64,
    /// Favorited recipe
    pub recipe_id: i64,
    /// When the bookmark was added
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Favorite and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each favorite belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// Each favorite points at one recipe
    #[sea_orm(
        belongs_to = "super::recipe::Entity",
        from = "Column::RecipeId",
        to = "super::recipe::Column::Id",
        on_delete = "Cascade"
    )]
    Recipe,
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipe.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
