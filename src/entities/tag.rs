//! Tag entity - Labels recipes are grouped and filtered by.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tag database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    /// Unique identifier for the tag
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique
    #[sea_orm(unique)]
    pub name: String,
    /// Hex color in `#RRGGBB` form
    pub color: String,
    /// URL-safe identifier used by the recipe filter, unique
    #[sea_orm(unique)]
    pub slug: String,
}

/// Defines relationships between Tag and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One tag is attached to many recipes through `recipe_tags`
    #[sea_orm(has_many = "super::recipe_tag::Entity")]
    RecipeTags,
}

impl Related<super::recipe_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeTags.def()
    }
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        super::recipe_tag::Relation::Recipe.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::recipe_tag::Relation::Tag.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
