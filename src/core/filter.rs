//! Recipe list filtering.
//!
//! [`apply`] composes the optional criteria of a [`RecipeFilter`] onto any recipe
//! query. Every clause is a subquery on the recipe id, so joins never duplicate a
//! recipe however many tags or ledger rows match it.

use crate::{
    core::recipe::newest_first,
    entities::{
        CartEntry, Favorite, Recipe, RecipeTag, Tag, cart_entry, favorite, recipe, recipe_tag, tag,
    },
    errors::Result,
};
use sea_orm::{
    Select,
    prelude::*,
    sea_query::{Expr, Query, SelectStatement},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Criteria for narrowing a recipe list. The default matches every recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeFilter {
    /// Only recipes by this author
    pub author: Option<i64>,
    /// Only recipes carrying at least one of these tag slugs
    pub tags: Vec<String>,
    /// Only recipes in the viewer's favorites
    pub is_favorited: bool,
    /// Only recipes in the viewer's shopping cart
    pub is_in_shopping_cart: bool,
}

fn tagged_with(slugs: &[String]) -> SelectStatement {
    let tag_ids = Query::select()
        .column(tag::Column::Id)
        .from(Tag)
        .and_where(tag::Column::Slug.is_in(slugs.iter().cloned()))
        .to_owned();
    Query::select()
        .column(recipe_tag::Column::RecipeId)
        .from(RecipeTag)
        .and_where(recipe_tag::Column::TagId.in_subquery(tag_ids))
        .to_owned()
}

fn favorited_by(user_id: i64) -> SelectStatement {
    Query::select()
        .column(favorite::Column::RecipeId)
        .from(Favorite)
        .and_where(favorite::Column::UserId.eq(user_id))
        .to_owned()
}

fn in_cart_of(user_id: i64) -> SelectStatement {
    Query::select()
        .column(cart_entry::Column::RecipeId)
        .from(CartEntry)
        .and_where(cart_entry::Column::UserId.eq(user_id))
        .to_owned()
}

/// Restricts `base` to the recipes matching `criteria` as seen by `viewer`.
///
/// Clauses combine with AND. `tags` matches any of the slugs. The ledger flags
/// need a viewer: for anonymous viewers a set flag matches nothing.
#[must_use]
pub fn apply(base: Select<Recipe>, viewer: Option<i64>, criteria: &RecipeFilter) -> Select<Recipe> {
    let mut query = base;

    if let Some(author_id) = criteria.author {
        query = query.filter(recipe::Column::AuthorId.eq(author_id));
    }
    if !criteria.tags.is_empty() {
        query = query.filter(recipe::Column::Id.in_subquery(tagged_with(&criteria.tags)));
    }
    if criteria.is_favorited {
        query = match viewer {
            Some(user_id) => query.filter(recipe::Column::Id.in_subquery(favorited_by(user_id))),
            None => query.filter(Expr::val(1).eq(0)),
        };
    }
    if criteria.is_in_shopping_cart {
        query = match viewer {
            Some(user_id) => query.filter(recipe::Column::Id.in_subquery(in_cart_of(user_id))),
            None => query.filter(Expr::val(1).eq(0)),
        };
    }

    query
}

/// Lists the recipes matching `criteria`, newest first.
#[instrument(skip(db))]
pub async fn filter_recipes(
    db: &DatabaseConnection,
    viewer: Option<i64>,
    criteria: &RecipeFilter,
) -> Result<Vec<recipe::Model>> {
    let recipes = newest_first(apply(Recipe::find(), viewer, criteria))
        .all(db)
        .await?;
    debug!(count = recipes.len(), "Filtered recipes");
    Ok(recipes)
}
