//! Recipe entity - A published recipe.
//!
//! Each recipe belongs to one author and owns its ingredient lines and tag links.
//! Favorites and cart entries point at recipes and are removed with them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recipe database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    /// Unique identifier for the recipe
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the user who published the recipe
    pub author_id: i64,
    /// Title of the recipe
    pub name: String,
    /// Reference to the stored picture (path or URL), opaque to the core
    pub image: String,
    /// Preparation instructions
    pub text: String,
    /// Cooking time in minutes
    pub cooking_time: i32,
    /// When the recipe was published
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Recipe and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each recipe belongs to one author; authors with recipes cannot be removed
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Restrict"
    )]
    Author,
    /// One recipe has many ingredient lines
    #[sea_orm(has_many = "super::recipe_ingredient::Entity")]
    RecipeIngredients,
    /// One recipe has many tag links
    #[sea_orm(has_many = "super::recipe_tag::Entity")]
    RecipeTags,
    /// One recipe is favorited by many users
    #[sea_orm(has_many = "super::favorite::Entity")]
    Favorites,
    /// One recipe sits in many shopping carts
    #[sea_orm(has_many = "super::cart_entry::Entity")]
    CartEntries,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::recipe_ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeIngredients.def()
    }
}

impl Related<super::recipe_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeTags.def()
    }
}

impl Related<super::favorite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorites.def()
    }
}

impl Related<super::cart_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartEntries.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::recipe_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::recipe_tag::Relation::Recipe.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
